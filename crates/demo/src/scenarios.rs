//! The demonstration scripts, one function per scenario.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use ormkit_core::KeyValue;
use ormkit_idgen::{SignedIdGenerator, SignedIdentifier};
use ormkit_persistence::{KeyStrategy, PersistenceError, PersistenceUnit, StrategyRegistry};

use crate::config::AppConfig;
use crate::entities::{Employee, Stock, Student};

/// Build the persistence unit with the demo entities registered.
///
/// Students use a signed-identifier generator over the process-wide key pair.
pub fn build_unit(config: &AppConfig) -> Result<(PersistenceUnit, Arc<SignedIdGenerator>)> {
    let generator = Arc::new(
        SignedIdGenerator::process_default()
            .context("cannot mint student identifiers without a key pair")?
            .with_config(config.generator)?,
    );
    build_unit_with(config, generator.clone()).map(|unit| (unit, generator))
}

/// As [`build_unit`], with a caller-provided generator (fixed keys in tests).
pub fn build_unit_with(
    config: &AppConfig,
    generator: Arc<SignedIdGenerator>,
) -> Result<PersistenceUnit> {
    let registry = StrategyRegistry::new()
        .register::<Employee>(KeyStrategy::Identity)
        .register::<Student>(KeyStrategy::Generated(generator))
        .register::<Stock>(KeyStrategy::Assigned);
    Ok(PersistenceUnit::new(config.persistence.clone(), registry)?)
}

/// Insert employees in one transaction; returns their keys.
pub fn hire(unit: &PersistenceUnit, people: &[(&str, &str)]) -> Result<Vec<KeyValue>> {
    let mut ctx = unit.create_context();
    ctx.begin()?;
    let mut keys = Vec::with_capacity(people.len());
    for (name, address) in people {
        keys.push(ctx.persist(Employee::new(*name, *address))?);
    }
    ctx.commit()?;
    Ok(keys)
}

/// What the rename scenario observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub original: String,
    pub committed: String,
    pub in_context_after_commit: String,
    pub stored: String,
}

/// Find an employee, rename it and commit, then rename it again without
/// committing. Only the first rename reaches the database.
pub fn rename_employee(
    unit: &PersistenceUnit,
    key: KeyValue,
    committed_name: &str,
    uncommitted_name: &str,
) -> Result<RenameOutcome> {
    let mut ctx = unit.create_context();
    ctx.begin()?;

    let employee = ctx
        .find::<Employee>(key.clone())?
        .with_context(|| format!("employee {key} not found"))?;
    let original = employee.name.clone();
    tracing::info!(%key, name = %original, "found employee");

    employee.name = committed_name.to_string();
    ctx.commit()?;

    let employee = ctx
        .find::<Employee>(key.clone())?
        .with_context(|| format!("employee {key} vanished after commit"))?;
    employee.name = uncommitted_name.to_string();
    let in_context_after_commit = employee.name.clone();
    ctx.close();

    let mut check = unit.create_context();
    let stored = check
        .find::<Employee>(key.clone())?
        .with_context(|| format!("employee {key} not found on reload"))?
        .name
        .clone();

    Ok(RenameOutcome {
        original,
        committed: committed_name.to_string(),
        in_context_after_commit,
        stored,
    })
}

/// Enroll students in one transaction; returns their signed identifiers.
pub fn enroll(unit: &PersistenceUnit, names: &[&str]) -> Result<Vec<SignedIdentifier>> {
    let mut ctx = unit.create_context();
    ctx.begin()?;
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let key = ctx.persist(Student::new(*name, "Campus"))?;
        ids.push(SignedIdentifier::parse(key.as_text()?)?);
    }
    ctx.commit()?;
    Ok(ids)
}

/// Insert stock lines under composite keys; a duplicate `(code, number)` is refused.
pub fn stock_up(unit: &PersistenceUnit, lines: &[(&str, i64, &str)]) -> Result<usize> {
    let mut ctx = unit.create_context();
    ctx.begin()?;
    for (code, number, color) in lines {
        match ctx.persist(Stock::new(*code, *number, *color)) {
            Ok(_) => {}
            Err(PersistenceError::EntityExists { key, .. }) => {
                tracing::warn!(%key, "duplicate stock line skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ctx.commit()?.inserted)
}

/// Remove an employee, then roll back: the employee is still stored.
pub fn remove_then_roll_back(unit: &PersistenceUnit, key: KeyValue) -> Result<bool> {
    let mut ctx = unit.create_context();
    ctx.begin()?;
    ctx.remove::<Employee>(key.clone())?;
    ctx.rollback()?;

    if ctx.find::<Employee>(key.clone())?.is_none() {
        bail!("employee {key} lost after rollback");
    }
    Ok(unit.database().contains("employee", &key)?)
}
