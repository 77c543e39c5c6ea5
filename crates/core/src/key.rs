//! Primary-key values.
//!
//! Entities expose their identity as a [`KeyValue`], whatever the underlying
//! column types are: an auto-increment integer, a generated string, or a
//! composite of several columns.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A primary-key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// Integer key (identity / auto-increment columns).
    Int(i64),
    /// Text key (assigned codes, generated identifiers).
    Text(String),
    /// Multi-column key, in column declaration order.
    Composite(Vec<KeyValue>),
}

impl KeyValue {
    pub fn composite(parts: impl IntoIterator<Item = KeyValue>) -> Self {
        Self::Composite(parts.into_iter().collect())
    }

    pub fn as_int(&self) -> DomainResult<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(DomainError::invalid_key(format!(
                "expected integer key, got {other}"
            ))),
        }
    }

    pub fn as_text(&self) -> DomainResult<&str> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(DomainError::invalid_key(format!("expected text key, got {other}"))),
        }
    }

    /// Parts of a composite key; `arity` must match exactly.
    pub fn parts(&self, arity: usize) -> DomainResult<&[KeyValue]> {
        match self {
            Self::Composite(parts) if parts.len() == arity => Ok(parts),
            other => Err(DomainError::invalid_key(format!(
                "expected composite key of {arity} parts, got {other}"
            ))),
        }
    }
}

impl core::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    core::fmt::Display::fmt(part, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
