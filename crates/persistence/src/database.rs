//! In-memory tables.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use ormkit_core::{KeyValue, Row};

use crate::error::{PersistenceError, PersistenceResult};

/// Target used for statement logging when `show_sql` is on.
pub const SQL_LOG_TARGET: &str = "ormkit::sql";

/// A pending write, produced by a context flush.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert {
        entity: &'static str,
        key: KeyValue,
        row: Row,
    },
    Update {
        entity: &'static str,
        key: KeyValue,
        row: Row,
    },
    Delete {
        entity: &'static str,
        key: KeyValue,
    },
}

impl Change {
    pub fn entity(&self) -> &'static str {
        match self {
            Change::Insert { entity, .. }
            | Change::Update { entity, .. }
            | Change::Delete { entity, .. } => *entity,
        }
    }

    pub fn key(&self) -> &KeyValue {
        match self {
            Change::Insert { key, .. } | Change::Update { key, .. } | Change::Delete { key, .. } => {
                key
            }
        }
    }

    /// Equivalent SQL, with `?` placeholders instead of values.
    pub fn to_sql(&self) -> String {
        match self {
            Change::Insert { entity, row, .. } => {
                let columns: Vec<&str> = row.keys().map(String::as_str).collect();
                let params = vec!["?"; columns.len()];
                format!(
                    "insert into {entity} ({}) values ({})",
                    columns.join(", "),
                    params.join(", ")
                )
            }
            Change::Update { entity, row, .. } => {
                let sets: Vec<String> = row.keys().map(|c| format!("{c}=?")).collect();
                format!("update {entity} set {} where <key>=?", sets.join(", "))
            }
            Change::Delete { entity, .. } => format!("delete from {entity} where <key>=?"),
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<KeyValue, Row>,
    last_identity: i64,
}

/// Thread-safe in-memory database: one table per registered entity.
///
/// Shared by every context of a persistence unit. Batches of changes are
/// applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<HashMap<&'static str, Table>>,
    show_sql: bool,
}

impl InMemoryDatabase {
    pub fn new(show_sql: bool) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            show_sql,
        }
    }

    pub fn create_table(&self, entity: &'static str) -> PersistenceResult<()> {
        let mut tables = self.write()?;
        if !tables.contains_key(entity) {
            tables.insert(entity, Table::default());
            self.log_sql(|| format!("create table {entity}"));
        }
        Ok(())
    }

    pub fn drop_all(&self) -> PersistenceResult<()> {
        let mut tables = self.write()?;
        for entity in tables.keys() {
            self.log_sql(|| format!("drop table if exists {entity}"));
        }
        tables.clear();
        Ok(())
    }

    /// Allocate the next identity value for `entity` (1, 2, 3, ...).
    ///
    /// Allocation is not undone by rollback, so identity values can have gaps.
    pub fn next_identity(&self, entity: &'static str) -> PersistenceResult<i64> {
        let mut tables = self.write()?;
        let table = tables
            .get_mut(entity)
            .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))?;
        table.last_identity += 1;
        Ok(table.last_identity)
    }

    pub fn load(&self, entity: &'static str, key: &KeyValue) -> PersistenceResult<Option<Row>> {
        let tables = self.read()?;
        let table = tables
            .get(entity)
            .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))?;
        if self.show_sql {
            let columns: Vec<&str> = table
                .rows
                .values()
                .next()
                .map(|row| row.keys().map(String::as_str).collect())
                .unwrap_or_default();
            tracing::info!(target: SQL_LOG_TARGET, "select {} from {entity} where <key>=?", columns.join(", "));
        }
        Ok(table.rows.get(key).cloned())
    }

    pub fn contains(&self, entity: &'static str, key: &KeyValue) -> PersistenceResult<bool> {
        let tables = self.read()?;
        let table = tables
            .get(entity)
            .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))?;
        Ok(table.rows.contains_key(key))
    }

    pub fn count(&self, entity: &'static str) -> PersistenceResult<usize> {
        let tables = self.read()?;
        tables
            .get(entity)
            .map(|t| t.rows.len())
            .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))
    }

    /// Apply a batch of changes: all of them, or none if any is invalid.
    pub fn apply(&self, changes: &[Change]) -> PersistenceResult<()> {
        let mut tables = self.write()?;

        // Validate against the table state as it evolves through the batch.
        let mut inserted: HashSet<(&'static str, &KeyValue)> = HashSet::new();
        let mut deleted: HashSet<(&'static str, &KeyValue)> = HashSet::new();
        for change in changes {
            let entity = change.entity();
            let key = change.key();
            let table = tables
                .get(entity)
                .ok_or_else(|| PersistenceError::UnknownEntity(entity.to_string()))?;
            let present = (table.rows.contains_key(key) || inserted.contains(&(entity, key)))
                && !deleted.contains(&(entity, key));

            match change {
                Change::Insert { .. } if present => {
                    return Err(PersistenceError::EntityExists {
                        entity,
                        key: key.clone(),
                    });
                }
                Change::Insert { .. } => {
                    deleted.remove(&(entity, key));
                    inserted.insert((entity, key));
                }
                Change::Update { .. } | Change::Delete { .. } if !present => {
                    return Err(PersistenceError::NotFound {
                        entity,
                        key: key.clone(),
                    });
                }
                Change::Update { .. } => {}
                Change::Delete { .. } => {
                    inserted.remove(&(entity, key));
                    deleted.insert((entity, key));
                }
            }
        }

        for change in changes {
            self.log_sql(|| change.to_sql());
            let Some(table) = tables.get_mut(change.entity()) else {
                continue;
            };
            match change {
                Change::Insert { key, row, .. } | Change::Update { key, row, .. } => {
                    table.rows.insert(key.clone(), row.clone());
                }
                Change::Delete { key, .. } => {
                    table.rows.remove(key);
                }
            }
        }

        Ok(())
    }

    fn log_sql(&self, statement: impl FnOnce() -> String) {
        if self.show_sql {
            tracing::info!(target: SQL_LOG_TARGET, "{}", statement());
        }
    }

    fn read(
        &self,
    ) -> PersistenceResult<std::sync::RwLockReadGuard<'_, HashMap<&'static str, Table>>> {
        self.tables
            .read()
            .map_err(|_| PersistenceError::Storage("lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> PersistenceResult<std::sync::RwLockWriteGuard<'_, HashMap<&'static str, Table>>> {
        self.tables
            .write()
            .map_err(|_| PersistenceError::Storage("lock poisoned".to_string()))
    }
}
