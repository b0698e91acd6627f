//! Fixed-length public key used to authenticate feeds manager messages.

use super::FeedsDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a feeds manager public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// A 32-byte public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Wraps a key of the correct length.
    #[must_use]
    pub const fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsDomainError::InvalidPublicKeyLength`] unless the slice is
    /// exactly [`PUBLIC_KEY_LENGTH`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FeedsDomainError> {
        let key = <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes).map_err(|_| {
            FeedsDomainError::InvalidPublicKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            }
        })?;
        Ok(Self(key))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Returns the lowercase hex encoding of the key.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = FeedsDomainError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
