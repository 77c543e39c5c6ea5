use ormkit_idgen::GeneratorConfig;
use ormkit_persistence::PersistenceConfig;

/// Process configuration, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub persistence: PersistenceConfig,
    pub generator: GeneratorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            persistence: PersistenceConfig::from_env(),
            generator: GeneratorConfig::from_env(),
        }
    }
}
