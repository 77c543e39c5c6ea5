use std::sync::Arc;

use ormkit_core::KeyValue;
use ormkit_demo::entities::{Employee, Stock};
use ormkit_demo::{AppConfig, scenarios};
use ormkit_idgen::{GeneratorConfig, KeyPair, SignedIdGenerator};
use ormkit_persistence::PersistenceUnit;

const TEST_KEY_PEM: &str = include_str!("../../idgen/tests/fixtures/test_key.pem");

fn fixture_keys() -> Arc<KeyPair> {
    Arc::new(KeyPair::from_pkcs8_pem(TEST_KEY_PEM).expect("fixture key"))
}

fn unit_with(generator: GeneratorConfig) -> (PersistenceUnit, Arc<SignedIdGenerator>) {
    let config = AppConfig {
        generator,
        ..AppConfig::default()
    };
    let generator = Arc::new(
        SignedIdGenerator::new(fixture_keys())
            .with_config(generator)
            .expect("valid config"),
    );
    let unit = scenarios::build_unit_with(&config, generator.clone()).expect("unit");
    (unit, generator)
}

#[test]
fn employees_get_sequential_identities() {
    let (unit, _) = unit_with(GeneratorConfig::default());
    let keys = scenarios::hire(&unit, &[("a", "x"), ("b", "y"), ("c", "z")]).unwrap();
    assert_eq!(
        keys,
        vec![KeyValue::Int(1), KeyValue::Int(2), KeyValue::Int(3)]
    );
    assert_eq!(unit.database().count("employee").unwrap(), 3);
}

#[test]
fn only_the_committed_rename_is_stored() {
    let (unit, _) = unit_with(GeneratorConfig::default());
    let keys = scenarios::hire(&unit, &[("Example name", "Example address")]).unwrap();

    let outcome =
        scenarios::rename_employee(&unit, keys[0].clone(), "Doguhan", "not committed").unwrap();

    assert_eq!(outcome.original, "Example name");
    assert_eq!(outcome.in_context_after_commit, "not committed");
    assert_eq!(outcome.stored, "Doguhan");
}

#[test]
fn renaming_a_missing_employee_fails() {
    let (unit, _) = unit_with(GeneratorConfig::default());
    let err = scenarios::rename_employee(&unit, KeyValue::Int(42), "a", "b").unwrap_err();
    assert!(err.to_string().contains("42"));
}

#[test]
fn default_student_keys_are_truncated_and_unverifiable() {
    let (unit, generator) = unit_with(GeneratorConfig::default());
    let ids = scenarios::enroll(&unit, &["Ada", "Grace"]).unwrap();

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    for id in &ids {
        assert_eq!(id.as_key().len(), 36 + 1 + 100);
        assert!(id.is_truncated(generator.keys()));
        assert!(id.verify(generator.keys()).is_err());
        assert!(
            unit.database()
                .contains("student", &KeyValue::Text(id.to_string()))
                .unwrap()
        );
    }
}

#[test]
fn untruncated_student_keys_verify() {
    let (unit, generator) = unit_with(GeneratorConfig::untruncated());
    let ids = scenarios::enroll(&unit, &["Linus"]).unwrap();

    assert_eq!(ids[0].as_key().len(), 36 + 1 + 344);
    assert!(ids[0].verify(generator.keys()).is_ok());
}

#[test]
fn duplicate_stock_lines_are_skipped() {
    let (unit, _) = unit_with(GeneratorConfig::default());
    let inserted = scenarios::stock_up(
        &unit,
        &[("AAPL", 1, "red"), ("AAPL", 2, "blue"), ("AAPL", 1, "green")],
    )
    .unwrap();

    assert_eq!(inserted, 2);
    assert!(
        unit.database()
            .contains("stock", &Stock::key_of("AAPL", 1))
            .unwrap()
    );

    let mut ctx = unit.create_context();
    let red = ctx
        .find::<Stock>(Stock::key_of("AAPL", 1))
        .unwrap()
        .unwrap();
    assert_eq!(red.color, "red");
}

#[test]
fn rolled_back_removal_keeps_the_employee() {
    let (unit, _) = unit_with(GeneratorConfig::default());
    let keys = scenarios::hire(&unit, &[("a", "x")]).unwrap();

    assert!(scenarios::remove_then_roll_back(&unit, keys[0].clone()).unwrap());

    let mut ctx = unit.create_context();
    assert!(ctx.find::<Employee>(keys[0].clone()).unwrap().is_some());
}
