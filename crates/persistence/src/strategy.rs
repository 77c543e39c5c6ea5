//! Per-entity primary-key strategies.

use std::collections::HashMap;
use std::sync::Arc;

use ormkit_core::Entity;
use ormkit_idgen::IdentifierGenerator;

use crate::error::{PersistenceError, PersistenceResult};

/// How an entity gets its primary key.
#[derive(Clone)]
pub enum KeyStrategy {
    /// Auto-increment integer allocated by the database, starting at 1.
    Identity,
    /// Set by the caller before persisting (natural or composite keys).
    Assigned,
    /// Text key produced by a generator, once, before insert.
    Generated(Arc<dyn IdentifierGenerator>),
}

impl KeyStrategy {
    pub fn generated(generator: impl IdentifierGenerator + 'static) -> Self {
        Self::Generated(Arc::new(generator))
    }
}

impl core::fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Assigned => f.write_str("Assigned"),
            Self::Generated(g) => f.debug_tuple("Generated").field(&g.name()).finish(),
        }
    }
}

/// Entity name → key strategy. Only registered entities can be stored.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, KeyStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `E`, replacing any earlier strategy for it.
    pub fn register<E: Entity>(mut self, strategy: KeyStrategy) -> Self {
        if let Some(previous) = self.strategies.insert(E::NAME, strategy) {
            tracing::debug!(entity = E::NAME, ?previous, "replaced key strategy");
        }
        self
    }

    pub fn strategy(&self, entity: &str) -> PersistenceResult<&KeyStrategy> {
        self.strategies
            .get(entity)
            .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.keys().copied()
    }
}
