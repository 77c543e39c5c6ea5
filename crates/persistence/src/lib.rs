//! Persistence layer: persistence unit, key strategies, unit of work.
//!
//! Storage is in-memory. What this crate models is the lifecycle around it:
//! entities are registered with a key strategy, keys are assigned before
//! insert, and a [`PersistenceContext`] tracks managed entities and flushes
//! only what changed when a transaction commits.

pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod strategy;
pub mod unit;


pub use config::{PersistenceConfig, SchemaMode};
pub use context::{CommitSummary, PersistenceContext};
pub use database::{Change, InMemoryDatabase};
pub use error::{PersistenceError, PersistenceResult};
pub use strategy::{KeyStrategy, StrategyRegistry};
pub use unit::PersistenceUnit;
