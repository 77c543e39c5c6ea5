use anyhow::Result;

use ormkit_demo::{AppConfig, scenarios};

fn main() -> Result<()> {
    ormkit_observability::init();

    let config = AppConfig::from_env();
    let (unit, generator) = scenarios::build_unit(&config)?;
    if !generator.produces_verifiable_keys() {
        tracing::warn!(
            max_signature_len = ?config.generator.max_signature_len,
            "student identifiers are truncated and cannot be verified; set ORMKIT_SIGNATURE_MAX_LEN=none to keep full signatures"
        );
    }

    let keys = scenarios::hire(
        &unit,
        &[("Example name", "Example address"), ("Example name 2", "Example address 2")],
    )?;

    let outcome = scenarios::rename_employee(
        &unit,
        keys[0].clone(),
        "Doguhan",
        "Renaming the employee without committing the transaction",
    )?;
    tracing::info!(
        original = %outcome.original,
        committed = %outcome.committed,
        in_context = %outcome.in_context_after_commit,
        stored = %outcome.stored,
        "rename scenario finished"
    );

    for id in scenarios::enroll(&unit, &["Ada", "Grace", "Linus"])? {
        let verified = id.verify(generator.keys()).is_ok();
        tracing::info!(key = %id, verified, "student enrolled");
    }

    let inserted = scenarios::stock_up(
        &unit,
        &[("AAPL", 1, "red"), ("AAPL", 2, "blue"), ("AAPL", 1, "green")],
    )?;
    tracing::info!(inserted, "stock lines stored");

    let still_there = scenarios::remove_then_roll_back(&unit, keys[1].clone())?;
    tracing::info!(still_there, "removal rolled back");

    unit.close()?;
    Ok(())
}
