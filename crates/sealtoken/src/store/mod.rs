//! Revocation store trait and the in-process implementation.
//!
//! A revocation registry is a namespaced sorted set: members are token
//! identifiers (see [`TokenId::revocation_key`](crate::TokenId::revocation_key)),
//! scores are the revoked token's original expiry. A record therefore means
//! "revoked until it would have expired anyway", and is pruned lazily as a
//! side effect of every revocation check rather than by a sweeper.
//!
//! # Implementations
//!
//! - [`InMemoryRevocationStore`] - single-process deployments and tests
//! - `sealtoken-redis` - Redis sorted sets shared across instances

pub mod memory;

use async_trait::async_trait;

use crate::TokenResult;

pub use memory::InMemoryRevocationStore;

/// Prefix for every registry key this crate writes.
pub const KEY_PREFIX: &str = "sealtoken:";

/// Registry key for a namespace, e.g. `sealtoken:sessions:revoked`.
#[must_use]
pub fn revocation_set_key(namespace: &str) -> String {
    format!("{KEY_PREFIX}{namespace}:revoked")
}

/// Storage for revoked token identifiers.
///
/// Failures must be reported as `TokenError::StoreUnavailable`; callers treat
/// them as fatal for the operation (fail-closed) and never as "not revoked".
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Checks whether `member` is revoked and prunes expired records.
    ///
    /// Both steps must happen as a single atomic request: the lookup sees the
    /// set as it was before pruning, and every member whose score is `<= now`
    /// is removed afterwards.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::StoreUnavailable` if the store cannot be reached.
    async fn check_and_prune(&self, set_key: &str, member: &str, now: i64) -> TokenResult<bool>;

    /// Records `member` as revoked until `expires_at`.
    ///
    /// Idempotent: revoking an already revoked member overwrites its score.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::StoreUnavailable` if the store cannot be reached.
    async fn add(&self, set_key: &str, member: &str, expires_at: i64) -> TokenResult<()>;
}
