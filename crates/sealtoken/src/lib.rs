//! # sealtoken
//!
//! Encrypted, self-contained bearer tokens with rotating keys and
//! server-side revocation.
//!
//! A token is a base-62 string wrapping an AES-256-GCM sealed payload that
//! holds a random identifier, an expiry and an ordered tuple of claim
//! values. The claim names live in configuration, not in the token, so the
//! payload stays small and opaque to clients.
//!
//! This crate provides:
//! - Token issuance, parsing and revocation through [`TokenService`]
//! - Key rotation without invalidating outstanding tokens
//! - A revocation registry that prunes itself as it is queried
//! - A bounded cache of validated claims for hot tokens
//!
//! ## Modules
//!
//! - [`config`] - Service configuration and validation
//! - [`service`] - Token lifecycle orchestration
//! - [`versions`] - Ordered key versions and decryption probing
//! - [`cipher`] - Authenticated encryption
//! - [`payload`] - Binary payload codec
//! - [`base62`] - Transport encoding
//! - [`store`] - Revocation store trait and the in-process store
//! - [`cache`] - Validated claims cache
//! - [`id`] - Token identifiers
//! - [`clock`] - Time sources
//!
//! The Redis revocation store lives in the `sealtoken-redis` crate.

pub mod base62;
pub mod cache;
pub mod cipher;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod payload;
pub mod service;
pub mod store;
pub mod versions;

pub use cache::{CacheStats, ClaimsCache};
pub use cipher::{Aes256GcmCipher, Cipher, DecryptError, EncryptionKey, KEY_SIZE};
pub use claims::{ClaimValue, Claims, ParsedClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError, KeyVersionConfig, RedisConfig, TokenConfig};
pub use error::{ErrorCategory, TokenError};
pub use id::{IdGenerator, TOKEN_ID_LEN, TokenId, UuidV7Generator};
pub use service::{ParseOptions, TokenService, TokenServiceBuilder};
pub use store::{InMemoryRevocationStore, RevocationStore, revocation_set_key};
pub use versions::{KeyVersion, VersionTable};

/// Type alias for token operation results.
pub type TokenResult<T> = Result<T, TokenError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sealtoken::prelude::*;
/// ```
pub mod prelude {
    pub use crate::TokenResult;
    pub use crate::claims::{ClaimValue, Claims, ParsedClaims};
    pub use crate::config::{ConfigError, TokenConfig};
    pub use crate::error::{ErrorCategory, TokenError};
    pub use crate::service::{ParseOptions, TokenService};
    pub use crate::store::{InMemoryRevocationStore, RevocationStore};
}
