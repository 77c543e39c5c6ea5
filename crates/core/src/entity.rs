//! Entity trait: identity + mapping of named fields to named columns.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::key::KeyValue;

/// A stored record: column name → column value.
pub type Row = Map<String, Value>;

/// Entity marker + minimal interface.
///
/// Column names are the entity's serde field names, so `#[serde(rename = "...")]`
/// is how a field is mapped to a differently named column.
pub trait Entity: Serialize + DeserializeOwned + Send + 'static {
    /// Entity (table) name.
    const NAME: &'static str;

    /// Returns the primary key, or `None` if it has not been assigned yet.
    fn key(&self) -> Option<KeyValue>;

    /// Set the primary key. Called once, before the first insert.
    fn assign_key(&mut self, key: KeyValue) -> DomainResult<()>;

    /// Serialize the entity into a column map.
    fn to_row(&self) -> DomainResult<Row> {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(other) => Err(DomainError::validation(format!(
                "{} does not map to columns (serialized as {other})",
                Self::NAME
            ))),
            Err(e) => Err(DomainError::validation(format!("{}: {e}", Self::NAME))),
        }
    }

    /// Rebuild the entity from a stored column map.
    fn from_row(row: Row) -> DomainResult<Self> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| DomainError::validation(format!("{}: {e}", Self::NAME)))
    }
}
