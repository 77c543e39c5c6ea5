//! Black-box tests for signed identifier generation, using a fixed key pair.

use std::collections::HashSet;
use std::sync::Arc;

use ormkit_idgen::{
    FixedSource, GeneratorConfig, IdentifierGenerator, KeyPair, SequenceSource,
    SignedIdGenerator, SignedIdentifier, VerificationError,
};
use uuid::Uuid;

const TEST_KEY: &str = include_str!("fixtures/test_key.pem");

const FIXED_UNIQUE: &str = "11111111-1111-1111-1111-111111111111";

/// `openssl dgst -sha256 -sign test_key.pem` over FIXED_UNIQUE, base64.
const FIXED_SIGNATURE: &str = "B+xiNi71Lwlv1enrKZk3jY7p60ur5OcSSw7+rlkpBwLUXSFA1SBc67GcN2MsXO7Hxev3BKg2t5Gbh4nbICGuA2XQxNheoI1WoyIdQY6gGZHTSN+5J9AmBAejAhrOKuEgHhwAkywm8FA31tn41bJkvVNZsLNIZilQOe0By/q+cR/uuOglSwtCw+d2jDA0JDOxkEWw7icQqS83kw1fZDI5kNjLqD7sM55v83WBdi8xYTCz8Hp3zdK7tXpiXiEsV4iALM84HVKEf5XhBzVM1mHmaxtYib+Zt3Zd0kwIqlIqtM5LYLfmT0aVKnOXtylLSLIOONYlnzRBiCTyVrhRakJ48w==";

fn test_keys() -> Arc<KeyPair> {
    Arc::new(KeyPair::from_pkcs8_pem(TEST_KEY).unwrap())
}

fn fixed_generator(keys: Arc<KeyPair>) -> SignedIdGenerator {
    SignedIdGenerator::new(keys).with_source(FixedSource(Uuid::parse_str(FIXED_UNIQUE).unwrap()))
}

#[test]
fn fixed_inputs_yield_the_known_truncated_key() {
    let id = fixed_generator(test_keys()).generate().unwrap();

    assert!(id.as_key().starts_with(&format!("{FIXED_UNIQUE}-")));
    assert_eq!(id.signature_part(), &FIXED_SIGNATURE[..100]);
    assert_eq!(id.as_key(), format!("{FIXED_UNIQUE}-{}", &FIXED_SIGNATURE[..100]));
}

#[test]
fn fixed_inputs_are_byte_identical_across_runs_and_generators() {
    let keys = test_keys();
    let a = fixed_generator(keys.clone()).generate().unwrap();
    let b = fixed_generator(keys).generate().unwrap();
    let c = fixed_generator(test_keys()).generate().unwrap();

    assert_eq!(a.as_key(), b.as_key());
    assert_eq!(a.as_key(), c.as_key());
}

#[test]
fn untruncated_fixed_key_matches_reference_signature() {
    let id = fixed_generator(test_keys())
        .with_config(GeneratorConfig::untruncated())
        .unwrap()
        .generate()
        .unwrap();

    assert_eq!(id.signature_part(), FIXED_SIGNATURE);
    assert!(id.verify(&test_keys()).is_ok());
}

#[test]
fn truncated_key_never_verifies() {
    let keys = test_keys();
    let id = fixed_generator(keys.clone()).generate().unwrap();

    assert!(id.signature_part().len() <= 100);
    assert!(matches!(
        id.verify(&keys),
        Err(VerificationError::Truncated { .. })
    ));
}

#[test]
fn ten_thousand_unique_parts_are_distinct() {
    let generator = SignedIdGenerator::new(test_keys());
    let mut seen = HashSet::with_capacity(10_000);

    for _ in 0..10_000 {
        let id = generator.generate().unwrap();
        assert!(seen.insert(id.unique_part().to_string()), "duplicate {id}");
        assert_eq!(id.unique_part().len(), 36);
        assert!((1..=100).contains(&id.signature_part().len()));
    }
}

#[test]
fn sequential_calls_share_one_public_key() {
    let generator = SignedIdGenerator::new(test_keys())
        .with_config(GeneratorConfig::untruncated())
        .unwrap();

    let first = generator.generate().unwrap();
    let second = generator.generate().unwrap();

    assert_ne!(first.unique(), second.unique());
    assert!(first.verify(generator.keys()).is_ok());
    assert!(second.verify(generator.keys()).is_ok());
}

#[test]
fn sequence_source_drives_unique_parts() {
    let values = vec![Uuid::from_u128(1), Uuid::from_u128(2)];
    let generator = SignedIdGenerator::new(test_keys())
        .with_source(SequenceSource::new(values.clone()).unwrap());

    let minted: Vec<Uuid> = (0..3).map(|_| generator.generate().unwrap().unique()).collect();
    assert_eq!(minted, vec![values[0], values[1], values[0]]);
}

#[test]
fn concurrent_generation_is_safe_and_unique() {
    let generator = Arc::new(
        SignedIdGenerator::new(test_keys())
            .with_config(GeneratorConfig::untruncated())
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = Arc::clone(&generator);
            std::thread::spawn(move || {
                (0..100)
                    .map(|_| generator.generate_key().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            let id: SignedIdentifier = key.parse().unwrap();
            assert!(id.verify(generator.keys()).is_ok());
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), 800);
}

#[test]
fn process_default_generators_share_the_process_key_pair() {
    let a = SignedIdGenerator::process_default().unwrap();
    let b = SignedIdGenerator::process_default().unwrap();
    assert!(Arc::ptr_eq(a.keys(), b.keys()));
}
