//! Persistence unit: configuration + registered entities + shared database.

use std::sync::Arc;

use crate::config::{PersistenceConfig, SchemaMode};
use crate::context::PersistenceContext;
use crate::database::InMemoryDatabase;
use crate::error::PersistenceResult;
use crate::strategy::StrategyRegistry;

/// State shared by every context of a unit.
pub(crate) struct Shared {
    pub(crate) registry: StrategyRegistry,
    pub(crate) database: InMemoryDatabase,
}

/// Factory for persistence contexts.
///
/// Creates a table for every registered entity at startup. Contexts opened
/// from the same unit see each other's committed writes.
pub struct PersistenceUnit {
    config: PersistenceConfig,
    shared: Arc<Shared>,
}

impl PersistenceUnit {
    pub fn new(config: PersistenceConfig, registry: StrategyRegistry) -> PersistenceResult<Self> {
        let database = InMemoryDatabase::new(config.show_sql);
        for entity in registry.entities() {
            database.create_table(entity)?;
        }

        tracing::info!(
            unit = %config.unit_name,
            schema = ?config.schema,
            entities = registry.entities().count(),
            "persistence unit started"
        );

        Ok(Self {
            config,
            shared: Arc::new(Shared { registry, database }),
        })
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn database(&self) -> &InMemoryDatabase {
        &self.shared.database
    }

    pub fn create_context(&self) -> PersistenceContext {
        PersistenceContext::new(Arc::clone(&self.shared))
    }

    /// Shut the unit down; `CreateDrop` drops every table.
    pub fn close(self) -> PersistenceResult<()> {
        if self.config.schema == SchemaMode::CreateDrop {
            self.shared.database.drop_all()?;
        }
        tracing::info!(unit = %self.config.unit_name, "persistence unit closed");
        Ok(())
    }
}
