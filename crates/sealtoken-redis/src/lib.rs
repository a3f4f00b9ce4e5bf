//! Redis revocation store for sealtoken.
//!
//! Each namespace's registry is one sorted set: members are token
//! identifiers, scores are the revoked token's original expiry. A check
//! reads the member's score and trims every record with a score `<= now`
//! inside a single `MULTI`/`EXEC`, so the registry never outgrows the set of
//! revoked tokens that could still be presented.
//!
//! ```ignore
//! use std::sync::Arc;
//! use sealtoken::{TokenConfig, TokenService};
//! use sealtoken_redis::RedisRevocationStore;
//!
//! let config = TokenConfig::from_toml_str(&source)?;
//! let store = RedisRevocationStore::connect(&config.redis).await?;
//! let service = TokenService::from_config(&config, Arc::new(store))?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use sealtoken::{RedisConfig, RevocationStore, TokenError, TokenResult};

/// Revocation registry backed by Redis sorted sets.
#[derive(Clone)]
pub struct RedisRevocationStore {
    pool: Pool,
}

impl RedisRevocationStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates a pool from configuration and verifies that Redis is reachable.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::StoreUnavailable` if the pool cannot be created or
    /// the first connection fails.
    pub async fn connect(config: &RedisConfig) -> TokenResult<Self> {
        tracing::info!(url = %config.url, "Connecting to Redis");

        let timeout = Duration::from_millis(config.timeout_ms);
        let mut redis_config = Config::from_url(&config.url);
        let mut pool_config = redis_config.get_pool_config();
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to create Redis pool");
                TokenError::store_unavailable(format!("failed to create Redis pool: {e}"))
            })?;

        let store = Self::new(pool);
        store.connection().await?;
        tracing::info!("Connected to Redis revocation store");

        Ok(store)
    }

    /// Returns true if a pooled connection can be obtained.
    pub async fn is_available(&self) -> bool {
        self.pool.get().await.is_ok()
    }

    async fn connection(&self) -> TokenResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to get Redis connection");
            TokenError::store_unavailable(format!("Redis connection failed: {e}"))
        })
    }
}

fn command_failed(err: redis::RedisError) -> TokenError {
    tracing::warn!(error = %err, "Redis command failed");
    TokenError::store_unavailable(format!("Redis command failed: {err}"))
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn check_and_prune(&self, set_key: &str, member: &str, now: i64) -> TokenResult<bool> {
        let mut conn = self.connection().await?;

        let (score, pruned): (Option<f64>, i64) = redis::pipe()
            .atomic()
            .zscore(set_key, member)
            .zrembyscore(set_key, "-inf", now)
            .query_async(&mut conn)
            .await
            .map_err(command_failed)?;

        if pruned > 0 {
            tracing::debug!(set_key = %set_key, pruned, "pruned expired revocations");
        }

        Ok(score.is_some())
    }

    async fn add(&self, set_key: &str, member: &str, expires_at: i64) -> TokenResult<()> {
        let mut conn = self.connection().await?;
        conn.zadd::<_, _, _, ()>(set_key, member, expires_at)
            .await
            .map_err(command_failed)
    }
}
