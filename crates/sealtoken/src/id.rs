//! Time-ordered token identifiers.
//!
//! Every token embeds a 16-byte identifier that is unique, sorts by issue
//! time, and carries a recoverable creation timestamp. The default generator
//! produces UUIDv7 values.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use uuid::Uuid;

use crate::TokenResult;
use crate::error::TokenError;

/// Identifier width in bytes.
pub const TOKEN_ID_LEN: usize = 16;

/// A token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId([u8; TOKEN_ID_LEN]);

impl TokenId {
    /// Wraps raw identifier bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; TOKEN_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds an identifier from a slice, returning `None` on a length mismatch.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Returns the raw identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TOKEN_ID_LEN] {
        &self.0
    }

    /// String form used as the revocation registry member.
    #[must_use]
    pub fn revocation_key(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Source of fresh identifiers.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier.
    fn generate(&self) -> TokenId;

    /// Recovers the creation time (Unix timestamp, seconds) embedded in `id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MalformedPayload` if `id` carries no timestamp.
    fn timestamp(&self, id: &TokenId) -> TokenResult<i64>;
}

/// UUIDv7 generator: 48-bit millisecond timestamp followed by random bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> TokenId {
        TokenId(Uuid::now_v7().into_bytes())
    }

    fn timestamp(&self, id: &TokenId) -> TokenResult<i64> {
        let (seconds, _) = Uuid::from_bytes(id.0)
            .get_timestamp()
            .ok_or_else(|| TokenError::malformed_payload("identifier carries no timestamp"))?
            .to_unix();
        i64::try_from(seconds)
            .map_err(|_| TokenError::malformed_payload("identifier timestamp out of range"))
    }
}
