//! Sources of the 128-bit unique part.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::RngCore;
use rand::rngs::OsRng;
use uuid::{Builder, Uuid};

use crate::error::{IdGenError, IdGenResult};

/// Supplies the unique part of each identifier.
pub trait UniqueSource: Send + Sync + core::fmt::Debug {
    fn next_unique(&self) -> IdGenResult<Uuid>;
}

/// Random (version 4) UUIDs drawn from the OS secure random source.
///
/// An unavailable source yields [`IdGenError::Entropy`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSource;

impl UniqueSource for RandomSource {
    fn next_unique(&self) -> IdGenResult<Uuid> {
        random_uuid(&mut OsRng)
    }
}

fn random_uuid<R: RngCore>(entropy: &mut R) -> IdGenResult<Uuid> {
    let mut bytes = [0u8; 16];
    entropy
        .try_fill_bytes(&mut bytes)
        .map_err(|e| IdGenError::Entropy(e.to_string()))?;
    Ok(Builder::from_random_bytes(bytes).into_uuid())
}

/// Always returns the same value. Intended for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub Uuid);

impl UniqueSource for FixedSource {
    fn next_unique(&self) -> IdGenResult<Uuid> {
        Ok(self.0)
    }
}

/// Replays a fixed list of values, wrapping around at the end. Intended for tests.
#[derive(Debug)]
pub struct SequenceSource {
    values: Vec<Uuid>,
    next: AtomicUsize,
}

impl SequenceSource {
    pub fn new(values: Vec<Uuid>) -> IdGenResult<Self> {
        if values.is_empty() {
            return Err(IdGenError::Config(
                "sequence source needs at least one value".to_string(),
            ));
        }
        Ok(Self {
            values,
            next: AtomicUsize::new(0),
        })
    }
}

impl UniqueSource for SequenceSource {
    fn next_unique(&self) -> IdGenResult<Uuid> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.values.len();
        Ok(self.values[idx])
    }
}
