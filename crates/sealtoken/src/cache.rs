//! Validated claims cache.
//!
//! Memoizes `token string -> claims` for tokens that already passed
//! decryption, payload decoding, the expiry check and a revocation check, so
//! hot tokens skip the key probe and the store round trip.
//!
//! ## Staleness
//!
//! A cache hit does not consult the revocation store. Revocations made
//! through the same [`TokenService`](crate::TokenService) evict the entry
//! immediately; revocations made by other processes become visible once the
//! entry is evicted, which `time_to_live` bounds. Expiry is still checked on
//! every hit by the service.
//!
//! ## Local revocations
//!
//! A parse that passed its revocation check may still be about to insert
//! when a local revoke evicts the same token. The cache therefore remembers
//! identifiers revoked through it, and [`ClaimsCache::insert`] re-checks that
//! set after writing: whichever of the two runs second removes the entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::claims::ParsedClaims;
use crate::config::CacheConfig;
use crate::id::TokenId;

/// Bounded LRU cache of validated claims keyed by raw token string.
pub struct ClaimsCache {
    entries: Cache<String, Arc<ParsedClaims>>,
    /// Identifiers revoked through this cache; outlives any entry it guards.
    revoked: Cache<TokenId, ()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ClaimsCache {
    /// Creates a cache with the configured capacity and time-to-live.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .eviction_policy(EvictionPolicy::lru());
        let mut revoked = Cache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
            revoked = revoked.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
            revoked: revoked.build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns cached claims for `token`.
    pub async fn get(&self, token: &str) -> Option<Arc<ParsedClaims>> {
        let claims = self.entries.get(token).await;
        if claims.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        claims
    }

    /// Caches validated claims for `token`.
    ///
    /// Returns `false`, leaving nothing cached, if the token's identifier was
    /// revoked through [`evict_revoked`](Self::evict_revoked).
    pub async fn insert(&self, token: &str, claims: Arc<ParsedClaims>) -> bool {
        let id = claims.id;
        self.entries.insert(token.to_string(), claims).await;

        // Re-check after the write so a concurrent revoke cannot be missed
        if self.revoked.contains_key(&id) {
            self.entries.invalidate(token).await;
            return false;
        }
        true
    }

    /// Removes `token` from the cache.
    pub async fn invalidate(&self, token: &str) {
        self.entries.invalidate(token).await;
    }

    /// Records `id` as revoked, then removes `token` from the cache.
    pub async fn evict_revoked(&self, token: &str, id: TokenId) {
        self.revoked.insert(id, ()).await;
        self.entries.invalidate(token).await;
    }

    /// Get cache statistics.
    ///
    /// `size` is approximate while evictions are pending.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Applies pending evictions so `stats().size` is exact.
    pub async fn sync(&self) {
        self.entries.run_pending_tasks().await;
    }
}

impl Default for ClaimsCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

/// Statistics for the claims cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of entries currently in the cache.
    pub size: u64,
    /// Number of lookups served from cache.
    pub hits: u64,
    /// Number of lookups that required full validation.
    pub misses: u64,
}
