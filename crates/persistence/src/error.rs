use thiserror::Error;

use ormkit_core::{DomainError, KeyValue};
use ormkit_idgen::IdGenError;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence operation error.
///
/// ## Error Categories
///
/// - **Transaction state**: `TransactionRequired`, `TransactionActive`, `RollbackOnly`, `Closed`
/// - **Keys**: `EntityExists`, `MissingKey`, `KeyAlreadySet`, `KeyChanged`, `IdGeneration`
/// - **Mapping**: `UnknownEntity`, `Domain`
/// - **Storage**: `NotFound`, `Storage`
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no active transaction")]
    TransactionRequired,

    #[error("a transaction is already active")]
    TransactionActive,

    /// The transaction was marked rollback-only; commit rolled it back instead.
    #[error("transaction was marked rollback-only and has been rolled back")]
    RollbackOnly,

    #[error("persistence context is closed")]
    Closed,

    #[error("entity '{0}' is not registered with this persistence unit")]
    UnknownEntity(String),

    #[error("{entity} with key {key} already exists")]
    EntityExists { entity: &'static str, key: KeyValue },

    #[error("{entity} with key {key} not found")]
    NotFound { entity: &'static str, key: KeyValue },

    /// Assigned-key entity persisted without a key.
    #[error("{0} has no key and its strategy does not generate one")]
    MissingKey(&'static str),

    /// Generated-key entity persisted with a key already set.
    #[error("{entity} already has key {key}; its strategy generates keys")]
    KeyAlreadySet { entity: &'static str, key: KeyValue },

    /// A managed entity's key was modified after assignment; keys are immutable.
    #[error("{entity} stored under key {key} now reports key {found:?}")]
    KeyChanged {
        entity: &'static str,
        key: KeyValue,
        found: Option<KeyValue>,
    },

    /// The entity's identifier generator failed; the transaction is rollback-only.
    #[error("identifier generation failed: {0}")]
    IdGeneration(#[from] IdGenError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),
}
