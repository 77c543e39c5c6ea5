//! Identifier generation error model.

use thiserror::Error;

/// Result type used by the generator.
pub type IdGenResult<T> = Result<T, IdGenError>;

/// The process could not produce (or load) an asymmetric key pair.
///
/// Fatal: a generator cannot exist without its key pair, and no unsigned
/// fallback identifiers are ever minted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("key generation failed: {0}")]
pub struct KeyGenerationError(pub String);

/// A single signing operation could not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

/// Error surfaced by `generate()`.
///
/// Neither kind is retried internally; the caller decides (typically by
/// aborting the enclosing unit of work).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdGenError {
    #[error(transparent)]
    KeyGeneration(#[from] KeyGenerationError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The secure random source could not supply a unique part.
    #[error("secure random source unavailable: {0}")]
    Entropy(String),

    /// Generator configuration was rejected.
    #[error("invalid generator config: {0}")]
    Config(String),
}

/// Signature check failure for a [`crate::SignedIdentifier`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The stored signature segment is shorter than a full signature encoding.
    ///
    /// Identifiers minted with a signature cap below the encoded length land
    /// here; they can be parsed but never verified.
    #[error("signature truncated to {actual} of {expected} characters")]
    Truncated { expected: usize, actual: usize },

    /// The signature segment is not valid base64 (or has the wrong length).
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// The signature does not match the unique part under this public key.
    #[error("signature does not match")]
    BadSignature,
}

/// Parse failure for a `<uuid>-<signature>` key string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("identifier too short ({0} characters)")]
    TooShort(usize),

    #[error("invalid unique part: {0}")]
    InvalidUnique(String),

    #[error("unique part is not in canonical lowercase form")]
    NonCanonical,

    #[error("expected '-' after the unique part")]
    MissingDelimiter,

    #[error("signature segment is {0} characters, over the allowed maximum")]
    SignatureTooLong(usize),

    #[error("invalid character {0:?} in signature segment")]
    InvalidSignatureChar(char),
}
