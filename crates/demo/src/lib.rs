//! Demonstration scripts: entities with three key strategies, driven through
//! persistence contexts.

pub mod config;
pub mod entities;
pub mod scenarios;

pub use config::AppConfig;
