//! The `<uuid>-<signature>` key value.

use core::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{ParseError, VerificationError};
use crate::keys::KeyPair;

/// Length of the canonical dashed UUID text.
pub const UNIQUE_PART_LEN: usize = 36;

/// Separator between the unique part and the signature segment.
pub const DELIMITER: char = '-';

/// Upper bound accepted when parsing a signature segment (covers untruncated
/// signatures of keys up to 24576 bits).
pub const MAX_SIGNATURE_SEGMENT: usize = 4096;

/// A signed primary key: `<uuid>-<signature>`.
///
/// Immutable once minted. The signature segment is standard base64, whose
/// alphabet never contains the delimiter, so the key splits unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignedIdentifier {
    key: String,
    unique: Uuid,
}

impl SignedIdentifier {
    pub(crate) fn from_parts(unique: Uuid, signature: &str) -> Self {
        let mut key = String::with_capacity(UNIQUE_PART_LEN + 1 + signature.len());
        key.push_str(&unique.hyphenated().to_string());
        key.push(DELIMITER);
        key.push_str(signature);
        Self { key, unique }
    }

    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.len() < UNIQUE_PART_LEN + 2 {
            return Err(ParseError::TooShort(s.chars().count()));
        }

        let unique_part = s
            .get(..UNIQUE_PART_LEN)
            .ok_or_else(|| ParseError::InvalidUnique("not ASCII".to_string()))?;
        let unique =
            Uuid::try_parse(unique_part).map_err(|e| ParseError::InvalidUnique(e.to_string()))?;
        if unique.hyphenated().to_string() != unique_part {
            return Err(ParseError::NonCanonical);
        }

        let rest = &s[UNIQUE_PART_LEN..];
        let signature = rest
            .strip_prefix(DELIMITER)
            .ok_or(ParseError::MissingDelimiter)?;
        if signature.len() > MAX_SIGNATURE_SEGMENT {
            return Err(ParseError::SignatureTooLong(signature.len()));
        }
        if let Some(c) = signature.chars().find(|c| !is_base64_char(*c)) {
            return Err(ParseError::InvalidSignatureChar(c));
        }

        Ok(Self {
            key: s.to_string(),
            unique,
        })
    }

    pub fn unique(&self) -> Uuid {
        self.unique
    }

    /// Canonical UUID text that was signed.
    pub fn unique_part(&self) -> &str {
        &self.key[..UNIQUE_PART_LEN]
    }

    pub fn signature_part(&self) -> &str {
        &self.key[UNIQUE_PART_LEN + 1..]
    }

    pub fn as_key(&self) -> &str {
        &self.key
    }

    /// Whether the stored segment is shorter than a full signature under `keys`.
    pub fn is_truncated(&self, keys: &KeyPair) -> bool {
        self.signature_part().len() < encoded_len(keys.signature_len())
    }

    /// Check the signature segment against the unique part.
    ///
    /// Truncated segments cannot be verified and always yield
    /// [`VerificationError::Truncated`].
    pub fn verify(&self, keys: &KeyPair) -> Result<(), VerificationError> {
        let expected = encoded_len(keys.signature_len());
        let actual = self.signature_part().len();
        if actual < expected {
            return Err(VerificationError::Truncated { expected, actual });
        }

        let signature = BASE64_STANDARD
            .decode(self.signature_part())
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        keys.verify(self.unique_part().as_bytes(), &signature)
    }
}

/// Base64 (padded) length of `n` raw bytes.
pub(crate) fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

impl core::fmt::Display for SignedIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for SignedIdentifier {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

impl From<SignedIdentifier> for String {
    fn from(value: SignedIdentifier) -> Self {
        value.key
    }
}

impl FromStr for SignedIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SignedIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

impl<'de> Deserialize<'de> for SignedIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
