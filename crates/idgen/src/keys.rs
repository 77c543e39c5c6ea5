//! Process-held RSA key pair.
//!
//! One pair signs every identifier minted by a generator. The pair is immutable
//! after construction: signing builds its digest state per call, so a single
//! `Arc<KeyPair>` is shared by any number of threads without locking.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{KeyGenerationError, SigningError, VerificationError};

/// Modulus size used for generated key pairs.
pub const DEFAULT_KEY_BITS: usize = 2048;

static PROCESS_KEYS: OnceLock<Result<Arc<KeyPair>, KeyGenerationError>> = OnceLock::new();

/// RSA key pair for RSASSA-PKCS1-v1_5 / SHA-256 signatures.
///
/// The private half never leaves this type.
pub struct KeyPair {
    signing: SigningKey<Sha256>,
    verifying: VerifyingKey<Sha256>,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a fresh pair from the OS random source.
    ///
    /// The OS source is read once, fallibly, to seed a CSPRNG; an unavailable
    /// source is reported as a [`KeyGenerationError`].
    pub fn generate(bits: usize) -> Result<Self, KeyGenerationError> {
        let mut rng = seeded_from(&mut OsRng)?;
        Self::generate_with(&mut rng, bits)
    }

    /// Generate a fresh pair from a caller-provided CSPRNG.
    pub fn generate_with<R>(rng: &mut R, bits: usize) -> Result<Self, KeyGenerationError>
    where
        R: RngCore + CryptoRng,
    {
        let started = Instant::now();
        let private = RsaPrivateKey::new(rng, bits)
            .map_err(|e| KeyGenerationError(format!("{bits}-bit RSA: {e}")))?;

        tracing::info!(
            bits,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated signing key pair"
        );

        Ok(Self::from_private(private))
    }

    /// Load a fixed private key (PKCS#8 PEM).
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, KeyGenerationError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| KeyGenerationError(format!("invalid PKCS#8 key: {e}")))?;
        Ok(Self::from_private(private))
    }

    /// The key pair shared by every generator in this process.
    ///
    /// Initialised on first use, at most once even when first use is concurrent.
    /// A failure is remembered: every later call returns the same error.
    pub fn process_wide() -> Result<Arc<Self>, KeyGenerationError> {
        PROCESS_KEYS
            .get_or_init(|| Self::generate(DEFAULT_KEY_BITS).map(Arc::new))
            .clone()
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self {
            verifying: VerifyingKey::new(public.clone()),
            signing: SigningKey::new(private),
            public,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Public key as SPKI PEM, for consumers that verify identifiers elsewhere.
    pub fn public_key_pem(&self) -> Result<String, KeyGenerationError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyGenerationError(format!("encoding public key: {e}")))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// Length in bytes of every signature made with this pair.
    pub fn signature_len(&self) -> usize {
        self.public.size()
    }

    /// Sign `message` (hash-then-sign, deterministic).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let signature = self
            .signing
            .try_sign(message)
            .map_err(|e| SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerificationError> {
        let signature = Signature::try_from(signature)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        self.verifying
            .verify(message, &signature)
            .map_err(|_| VerificationError::BadSignature)
    }
}

fn seeded_from<R: RngCore>(entropy: &mut R) -> Result<StdRng, KeyGenerationError> {
    let mut seed = <StdRng as SeedableRng>::Seed::default();
    entropy
        .try_fill_bytes(&mut seed)
        .map_err(|e| KeyGenerationError(format!("secure random source unavailable: {e}")))?;
    Ok(StdRng::from_seed(seed))
}

impl core::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}
