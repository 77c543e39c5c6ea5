//! `ormkit-core`: entity model building blocks.
//!
//! This crate contains **pure domain** primitives (no storage concerns).

pub mod entity;
pub mod error;
pub mod key;

pub use entity::{Entity, Row};
pub use error::{DomainError, DomainResult};
pub use key::KeyValue;
