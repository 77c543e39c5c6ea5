//! Demo entities.
//!
//! - `Employee`: integer key allocated by the database (identity).
//! - `Student`: signed identifier minted before insert.
//! - `Stock`: composite `(code, number)` key set by the caller.

use serde::{Deserialize, Serialize};

use ormkit_core::{DomainError, DomainResult, Entity, KeyValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Option<i64>,
    pub name: String,
    pub address: String,
}

impl Employee {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
        }
    }
}

impl Entity for Employee {
    const NAME: &'static str = "employee";

    fn key(&self) -> Option<KeyValue> {
        self.id.map(KeyValue::Int)
    }

    fn assign_key(&mut self, key: KeyValue) -> DomainResult<()> {
        self.id = Some(key.as_int()?);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
}

impl Student {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
        }
    }
}

impl Entity for Student {
    const NAME: &'static str = "student";

    fn key(&self) -> Option<KeyValue> {
        self.id.clone().map(KeyValue::Text)
    }

    fn assign_key(&mut self, key: KeyValue) -> DomainResult<()> {
        self.id = Some(key.as_text()?.to_string());
        Ok(())
    }
}

/// Stock line identified by `(code, number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub code: String,
    pub number: i64,
    pub color: String,
}

impl Stock {
    pub fn new(code: impl Into<String>, number: i64, color: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            number,
            color: color.into(),
        }
    }

    pub fn key_of(code: &str, number: i64) -> KeyValue {
        KeyValue::composite([KeyValue::from(code), KeyValue::Int(number)])
    }
}

impl Entity for Stock {
    const NAME: &'static str = "stock";

    fn key(&self) -> Option<KeyValue> {
        if self.code.is_empty() {
            None
        } else {
            Some(Self::key_of(&self.code, self.number))
        }
    }

    fn assign_key(&mut self, key: KeyValue) -> DomainResult<()> {
        let parts = key.parts(2)?;
        let code = parts[0].as_text()?;
        if code.is_empty() {
            return Err(DomainError::invalid_key("stock code must not be empty"));
        }
        self.code = code.to_string();
        self.number = parts[1].as_int()?;
        Ok(())
    }
}
