//! Persistence context: the unit of work over managed entities.
//!
//! A context keeps one managed instance per `(entity, key)`. Entities loaded
//! with [`PersistenceContext::find`] are snapshotted; at commit each managed
//! entity is serialized again and compared with its snapshot, and only rows
//! that differ are written (dirty checking). Nothing reaches the database
//! outside [`PersistenceContext::commit`].

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use ormkit_core::{DomainResult, Entity, KeyValue, Row};

use crate::database::Change;
use crate::error::{PersistenceError, PersistenceResult};
use crate::strategy::KeyStrategy;
use crate::unit::Shared;

/// Type-erased managed entity.
trait Tracked: Send {
    fn key(&self) -> Option<KeyValue>;
    fn to_row(&self) -> DomainResult<Row>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Entity> Tracked for E {
    fn key(&self) -> Option<KeyValue> {
        Entity::key(self)
    }

    fn to_row(&self) -> DomainResult<Row> {
        Entity::to_row(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EntryState {
    /// Persisted in this context, not yet inserted.
    New,
    /// Loaded from (or already written to) the database.
    Managed,
    /// Scheduled for deletion at commit.
    Removed,
}

struct Entry {
    entity: Box<dyn Tracked>,
    /// Row as last read from / written to the database.
    snapshot: Option<Row>,
    state: EntryState,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TxState {
    None,
    Active,
    RollbackOnly,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub committed_at: DateTime<Utc>,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

type EntryId = (&'static str, KeyValue);

/// Unit of work bound to one persistence unit.
///
/// Not shared between threads; open one context per unit of work.
pub struct PersistenceContext {
    shared: Arc<Shared>,
    entries: BTreeMap<EntryId, Entry>,
    tx: TxState,
    closed: bool,
}

impl PersistenceContext {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            entries: BTreeMap::new(),
            tx: TxState::None,
            closed: false,
        }
    }

    pub fn begin(&mut self) -> PersistenceResult<()> {
        self.ensure_open()?;
        if self.tx != TxState::None {
            return Err(PersistenceError::TransactionActive);
        }
        self.tx = TxState::Active;
        tracing::debug!("transaction started");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.tx != TxState::None
    }

    pub fn is_rollback_only(&self) -> bool {
        self.tx == TxState::RollbackOnly
    }

    /// Mark the active transaction so that it can only roll back.
    pub fn set_rollback_only(&mut self) -> PersistenceResult<()> {
        self.ensure_transaction()?;
        self.tx = TxState::RollbackOnly;
        Ok(())
    }

    /// Make `entity` managed and schedule its insert.
    ///
    /// The key is assigned here, exactly once, according to the entity's
    /// strategy. If the identifier generator fails, the transaction is marked
    /// rollback-only and the error is returned; nothing is inserted.
    pub fn persist<E: Entity>(&mut self, mut entity: E) -> PersistenceResult<KeyValue> {
        self.ensure_transaction()?;

        let key = match self.shared.registry.strategy(E::NAME)? {
            KeyStrategy::Assigned => entity.key().ok_or(PersistenceError::MissingKey(E::NAME))?,
            KeyStrategy::Identity => {
                Self::ensure_unset(&entity)?;
                KeyValue::Int(self.shared.database.next_identity(E::NAME)?)
            }
            KeyStrategy::Generated(generator) => {
                Self::ensure_unset(&entity)?;
                match generator.generate_key() {
                    Ok(key) => KeyValue::Text(key),
                    Err(e) => {
                        tracing::error!(
                            entity = E::NAME,
                            generator = generator.name(),
                            error = %e,
                            "identifier generation failed; transaction marked rollback-only"
                        );
                        self.tx = TxState::RollbackOnly;
                        return Err(e.into());
                    }
                }
            }
        };
        entity.assign_key(key.clone())?;

        let id = (E::NAME, key.clone());
        match self.entries.get(&id).map(|e| e.state) {
            Some(EntryState::Removed) => {
                // Re-persisting a removed entity cancels the delete.
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.entity = Box::new(entity);
                    entry.state = EntryState::Managed;
                }
            }
            Some(_) => return Err(PersistenceError::EntityExists { entity: E::NAME, key }),
            None => {
                if self.shared.database.contains(E::NAME, &key)? {
                    return Err(PersistenceError::EntityExists { entity: E::NAME, key });
                }
                self.entries.insert(
                    id,
                    Entry {
                        entity: Box::new(entity),
                        snapshot: None,
                        state: EntryState::New,
                    },
                );
            }
        }

        tracing::debug!(entity = E::NAME, %key, "persisted");
        Ok(key)
    }

    /// Look up an entity by key, loading it into the context on first access.
    ///
    /// The returned reference is the managed instance: changes made through it
    /// are written at the next commit.
    pub fn find<E: Entity>(&mut self, key: impl Into<KeyValue>) -> PersistenceResult<Option<&mut E>> {
        self.ensure_open()?;
        self.shared.registry.strategy(E::NAME)?;

        let id: EntryId = (E::NAME, key.into());
        if !self.entries.contains_key(&id) {
            let Some(row) = self.shared.database.load(E::NAME, &id.1)? else {
                return Ok(None);
            };
            let entity = E::from_row(row.clone())?;
            self.entries.insert(
                id.clone(),
                Entry {
                    entity: Box::new(entity),
                    snapshot: Some(row),
                    state: EntryState::Managed,
                },
            );
        }

        match self.entries.get_mut(&id) {
            Some(entry) if entry.state != EntryState::Removed => entry
                .entity
                .as_any_mut()
                .downcast_mut::<E>()
                .map(Some)
                .ok_or_else(|| {
                    PersistenceError::Storage(format!("managed {} has an unexpected type", E::NAME))
                }),
            _ => Ok(None),
        }
    }

    /// Whether `(E, key)` is currently managed by this context.
    pub fn contains<E: Entity>(&self, key: &KeyValue) -> bool {
        self.entries
            .get(&(E::NAME, key.clone()))
            .is_some_and(|e| e.state != EntryState::Removed)
    }

    /// Schedule the entity for deletion at commit.
    pub fn remove<E: Entity>(&mut self, key: impl Into<KeyValue>) -> PersistenceResult<()> {
        self.ensure_transaction()?;
        let key = key.into();
        if self.find::<E>(key.clone())?.is_none() {
            return Err(PersistenceError::NotFound { entity: E::NAME, key });
        }

        let id = (E::NAME, key);
        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.state == EntryState::New {
                self.entries.remove(&id);
            } else {
                entry.state = EntryState::Removed;
            }
        }
        tracing::debug!(entity = id.0, key = %id.1, "scheduled removal");
        Ok(())
    }

    /// Flush pending inserts, dirty rows and deletions, then end the transaction.
    ///
    /// A managed entity whose key no longer matches the key it was stored
    /// under fails the commit with [`PersistenceError::KeyChanged`] and rolls
    /// the transaction back.
    ///
    /// A rollback-only transaction is rolled back instead and reported as
    /// [`PersistenceError::RollbackOnly`].
    pub fn commit(&mut self) -> PersistenceResult<CommitSummary> {
        self.ensure_transaction()?;
        if self.tx == TxState::RollbackOnly {
            self.discard();
            tracing::warn!("commit on rollback-only transaction; rolled back");
            return Err(PersistenceError::RollbackOnly);
        }

        let changes = match self.pending_changes() {
            Ok(changes) => changes,
            Err(e) => {
                tracing::error!(error = %e, "flush rejected; transaction rolled back");
                self.discard();
                return Err(e);
            }
        };
        if let Err(e) = self.shared.database.apply(&changes) {
            tracing::error!(error = %e, "flush failed; transaction rolled back");
            self.discard();
            return Err(e);
        }

        let mut summary = CommitSummary {
            inserted: 0,
            updated: 0,
            deleted: 0,
            committed_at: Utc::now(),
        };
        for change in changes {
            match change {
                Change::Insert { entity, key, row } => {
                    summary.inserted += 1;
                    self.mark_written(entity, key, row);
                }
                Change::Update { entity, key, row } => {
                    summary.updated += 1;
                    self.mark_written(entity, key, row);
                }
                Change::Delete { entity, key } => {
                    summary.deleted += 1;
                    self.entries.remove(&(entity, key));
                }
            }
        }

        self.tx = TxState::None;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "transaction committed"
        );
        Ok(summary)
    }

    /// Discard pending work and detach every managed entity.
    pub fn rollback(&mut self) -> PersistenceResult<()> {
        self.ensure_transaction()?;
        self.discard();
        tracing::info!("transaction rolled back");
        Ok(())
    }

    /// Detach every managed entity without touching the transaction.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Close the context. An active transaction is rolled back.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.is_active() {
            tracing::warn!("closing context with an active transaction; rolling back");
            self.discard();
        }
        self.entries.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn pending_changes(&self) -> PersistenceResult<Vec<Change>> {
        let mut changes = Vec::new();
        for ((entity, key), entry) in &self.entries {
            let (entity, key) = (*entity, key.clone());
            if entry.state != EntryState::Removed {
                // Keys are assigned once; a managed entity may not re-key itself.
                let found = entry.entity.key();
                if found.as_ref() != Some(&key) {
                    return Err(PersistenceError::KeyChanged { entity, key, found });
                }
            }
            match entry.state {
                EntryState::New => changes.push(Change::Insert {
                    entity,
                    key,
                    row: entry.entity.to_row()?,
                }),
                EntryState::Managed => {
                    let row = entry.entity.to_row()?;
                    if entry.snapshot.as_ref() != Some(&row) {
                        changes.push(Change::Update { entity, key, row });
                    }
                }
                EntryState::Removed => changes.push(Change::Delete { entity, key }),
            }
        }
        Ok(changes)
    }

    fn mark_written(&mut self, entity: &'static str, key: KeyValue, row: Row) {
        if let Some(entry) = self.entries.get_mut(&(entity, key)) {
            entry.snapshot = Some(row);
            entry.state = EntryState::Managed;
        }
    }

    fn discard(&mut self) {
        self.entries.clear();
        self.tx = TxState::None;
    }

    fn ensure_unset<E: Entity>(entity: &E) -> PersistenceResult<()> {
        match entity.key() {
            Some(key) => Err(PersistenceError::KeyAlreadySet { entity: E::NAME, key }),
            None => Ok(()),
        }
    }

    fn ensure_open(&self) -> PersistenceResult<()> {
        if self.closed {
            Err(PersistenceError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_transaction(&self) -> PersistenceResult<()> {
        self.ensure_open()?;
        if self.tx == TxState::None {
            Err(PersistenceError::TransactionRequired)
        } else {
            Ok(())
        }
    }
}

impl Drop for PersistenceContext {
    fn drop(&mut self) {
        self.close();
    }
}
