//! Persistence-unit configuration.

use core::str::FromStr;

/// Schema management applied by a persistence unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SchemaMode {
    /// Create tables for registered entities when the unit starts.
    #[default]
    Create,
    /// As `Create`, and drop every table when the unit closes.
    CreateDrop,
}

impl FromStr for SchemaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "create-drop" | "create_drop" => Ok(Self::CreateDrop),
            other => Err(format!("unknown schema mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub unit_name: String,
    /// Log every flushed statement (target `ormkit::sql`).
    pub show_sql: bool,
    pub schema: SchemaMode,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            unit_name: "default".to_string(),
            show_sql: false,
            schema: SchemaMode::default(),
        }
    }
}

impl PersistenceConfig {
    /// Read `ORMKIT_UNIT`, `ORMKIT_SHOW_SQL` and `ORMKIT_SCHEMA`.
    ///
    /// Missing values use the defaults; invalid ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup("ORMKIT_UNIT").filter(|n| !n.trim().is_empty()) {
            config.unit_name = name.trim().to_string();
        }

        if let Some(raw) = lookup("ORMKIT_SHOW_SQL") {
            match parse_bool(&raw) {
                Some(v) => config.show_sql = v,
                None => tracing::warn!(value = %raw, "ORMKIT_SHOW_SQL is not a boolean; ignoring"),
            }
        }

        if let Some(raw) = lookup("ORMKIT_SCHEMA") {
            match raw.parse() {
                Ok(mode) => config.schema = mode,
                Err(e) => tracing::warn!(error = %e, "ORMKIT_SCHEMA ignored"),
            }
        }

        config
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
