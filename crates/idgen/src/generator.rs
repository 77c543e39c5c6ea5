//! Identifier generators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use uuid::Uuid;

use crate::error::{IdGenError, IdGenResult};
use crate::identifier::{SignedIdentifier, encoded_len};
use crate::keys::KeyPair;
use crate::source::{RandomSource, UniqueSource};

/// Default cap on the stored signature segment, in characters.
pub const DEFAULT_MAX_SIGNATURE_LEN: usize = 100;

/// Environment variable overriding [`GeneratorConfig::max_signature_len`].
pub const MAX_SIGNATURE_LEN_ENV: &str = "ORMKIT_SIGNATURE_MAX_LEN";

/// Pluggable primary-key strategy, invoked once per new record before insert.
///
/// The returned key is opaque ASCII text.
pub trait IdentifierGenerator: Send + Sync {
    fn generate_key(&self) -> IdGenResult<String>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

impl<G> IdentifierGenerator for Arc<G>
where
    G: IdentifierGenerator + ?Sized,
{
    fn generate_key(&self) -> IdGenResult<String> {
        (**self).generate_key()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Longest signature segment stored in a key; `None` stores it whole.
    ///
    /// A cap below the encoded signature length (344 characters for 2048-bit
    /// keys) keeps keys short but leaves them unverifiable.
    pub max_signature_len: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_signature_len: Some(DEFAULT_MAX_SIGNATURE_LEN),
        }
    }
}

impl GeneratorConfig {
    /// Store whole signatures (every key verifiable).
    pub fn untruncated() -> Self {
        Self {
            max_signature_len: None,
        }
    }

    /// Read `ORMKIT_SIGNATURE_MAX_LEN` (`none` disables the cap).
    ///
    /// Unset or unparsable values fall back to the default cap.
    pub fn from_env() -> Self {
        match std::env::var(MAX_SIGNATURE_LEN_ENV) {
            Ok(raw) => Self::parse_cap(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    value = %raw,
                    "{MAX_SIGNATURE_LEN_ENV} is not a positive integer or 'none'; using default"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn parse_cap(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("none") {
            return Some(Self::untruncated());
        }
        match raw.parse::<usize>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(Self {
                max_signature_len: Some(n),
            }),
        }
    }

    pub fn validate(&self) -> IdGenResult<()> {
        if self.max_signature_len == Some(0) {
            return Err(IdGenError::Config(
                "max_signature_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mints `<uuid>-<signature>` keys signed with a shared [`KeyPair`].
///
/// Safe to call from any number of threads: the key pair is read-only and each
/// call signs with its own digest state.
#[derive(Debug)]
pub struct SignedIdGenerator {
    keys: Arc<KeyPair>,
    source: Arc<dyn UniqueSource>,
    config: GeneratorConfig,
    truncation_logged: AtomicBool,
}

impl SignedIdGenerator {
    /// Generator over `keys`, random unique parts, default config.
    pub fn new(keys: Arc<KeyPair>) -> Self {
        Self {
            keys,
            source: Arc::new(RandomSource),
            config: GeneratorConfig::default(),
            truncation_logged: AtomicBool::new(false),
        }
    }

    /// Generator over the process-wide key pair (created on first use).
    pub fn process_default() -> IdGenResult<Self> {
        Ok(Self::new(KeyPair::process_wide()?))
    }

    pub fn with_source(mut self, source: impl UniqueSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> IdGenResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The pair signing every key from this generator.
    pub fn keys(&self) -> &Arc<KeyPair> {
        &self.keys
    }

    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    /// Whether keys from this generator can be verified.
    pub fn produces_verifiable_keys(&self) -> bool {
        match self.config.max_signature_len {
            Some(max) => max >= encoded_len(self.keys.signature_len()),
            None => true,
        }
    }

    /// Mint a new signed identifier.
    ///
    /// 1. draw a 128-bit value, render it as canonical UUID text
    /// 2. sign the text's UTF-8 bytes (SHA-256, PKCS#1 v1.5)
    /// 3. base64-encode the signature, cutting it to the configured cap
    /// 4. join with `-`
    pub fn generate(&self) -> IdGenResult<SignedIdentifier> {
        let unique: Uuid = self.source.next_unique()?;
        let unique_part = unique.hyphenated().to_string();

        let raw = self.keys.sign(unique_part.as_bytes())?;
        let mut signature = BASE64_STANDARD.encode(raw);

        if let Some(max) = self.config.max_signature_len {
            if signature.len() > max {
                self.log_truncation_once(signature.len(), max);
                signature.truncate(max);
            }
        }

        tracing::debug!(
            unique = %unique_part,
            signature_len = signature.len(),
            "minted signed identifier"
        );

        Ok(SignedIdentifier::from_parts(unique, &signature))
    }

    fn log_truncation_once(&self, full: usize, max: usize) {
        if !self.truncation_logged.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                full_len = full,
                max_len = max,
                "signature segments are truncated; keys from this generator cannot be verified"
            );
        }
    }
}

impl IdentifierGenerator for SignedIdGenerator {
    fn generate_key(&self) -> IdGenResult<String> {
        self.generate().map(String::from)
    }

    fn name(&self) -> &str {
        "signed-uuid"
    }
}

/// Plain random UUID keys, no signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdentifierGenerator for UuidGenerator {
    fn generate_key(&self) -> IdGenResult<String> {
        Ok(RandomSource.next_unique()?.hyphenated().to_string())
    }

    fn name(&self) -> &str {
        "uuid"
    }
}
