//! `ormkit-idgen`: signed primary-key generation.
//!
//! A [`SignedIdGenerator`] mints identifiers of the form `<uuid>-<signature>`,
//! where the signature is an RSA/SHA-256 signature over the UUID text made with
//! a key pair held for the lifetime of the process. Consumers holding the public
//! key can tell identifiers minted by this process from injected ones.

pub mod error;
pub mod generator;
pub mod identifier;
pub mod keys;
pub mod source;

pub use error::{
    IdGenError, IdGenResult, KeyGenerationError, ParseError, SigningError, VerificationError,
};
pub use generator::{
    DEFAULT_MAX_SIGNATURE_LEN, GeneratorConfig, IdentifierGenerator, SignedIdGenerator,
    UuidGenerator,
};
pub use identifier::SignedIdentifier;
pub use keys::{DEFAULT_KEY_BITS, KeyPair};
pub use source::{FixedSource, RandomSource, SequenceSource, UniqueSource};
