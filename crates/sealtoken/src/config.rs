//! Token service configuration.
//!
//! Configuration is consumed at construction time: a namespace that scopes
//! the revocation registry, the ordered list of key versions, and settings
//! for the validated-claims cache and the Redis revocation backend.
//!
//! # Example (TOML)
//!
//! ```toml
//! namespace = "sessions"
//! default_ttl = "1h"
//!
//! [[versions]]
//! key = "<64 hex chars or base64 of 32 bytes>"
//! claims = ["user_id", "role"]
//!
//! [cache]
//! max_capacity = 10000
//! time_to_live = "30s"
//!
//! [redis]
//! url = "redis://localhost:6379"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cipher::EncryptionKey;

/// Root token service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Namespace used to scope the revocation registry key.
    pub namespace: String,

    /// Key versions, newest first. The first entry signs every new token;
    /// all entries are tried when parsing.
    pub versions: Vec<KeyVersionConfig>,

    /// Lifetime used by [`TokenService::create_default`](crate::TokenService::create_default).
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Validated-claims cache configuration.
    pub cache: CacheConfig,

    /// Redis revocation store configuration.
    pub redis: RedisConfig,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            versions: Vec::new(),
            default_ttl: Duration::from_secs(3600), // 1 hour
            cache: CacheConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

/// One key version: an encryption key and its ordered claim schema.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyVersionConfig {
    /// 32-byte key, hex (64 chars) or base64 encoded.
    pub key: String,

    /// Claim names in payload order.
    pub claims: Vec<String>,
}

impl fmt::Debug for KeyVersionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyVersionConfig")
            .field("key", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Validated-claims cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached tokens.
    pub max_capacity: u64,

    /// Upper bound on how long a validated token is served from cache.
    /// Limits how long a revocation made by another process goes unnoticed.
    /// `None` keeps entries until evicted by capacity.
    #[serde(with = "humantime_serde")]
    pub time_to_live: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Some(Duration::from_secs(30)),
        }
    }
}

/// Redis configuration for the shared revocation registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379").
    pub url: String,

    /// Connection pool size.
    pub pool_size: usize,

    /// Pool wait/create/recycle timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            timeout_ms: 5000,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl TokenConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML, or any error
    /// reported by [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no key versions are configured, and
    /// `ConfigError::InvalidValue` if:
    /// - The namespace is empty
    /// - A key is not 32 bytes of hex or base64
    /// - A version has an empty or duplicate claim name
    /// - The default TTL, cache capacity or Redis pool limits are zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidValue(
                "namespace cannot be empty".to_string(),
            ));
        }

        if self.versions.is_empty() {
            return Err(ConfigError::Missing("versions".to_string()));
        }

        for (index, version) in self.versions.iter().enumerate() {
            EncryptionKey::parse(&version.key).map_err(|e| {
                ConfigError::InvalidValue(format!("versions[{index}].key: {e}"))
            })?;
            validate_claim_names(&version.claims)
                .map_err(|e| ConfigError::InvalidValue(format!("versions[{index}].claims: {e}")))?;
        }

        if self.default_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "default_ttl must be > 0".to_string(),
            ));
        }

        if self.cache.max_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "cache max_capacity must be > 0".to_string(),
            ));
        }

        if self.redis.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "redis pool_size must be > 0".to_string(),
            ));
        }

        if self.redis.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "redis timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Checks that claim names are non-empty and unique.
pub(crate) fn validate_claim_names(names: &[String]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            return Err("claim name cannot be empty".to_string());
        }
        if !seen.insert(name.as_str()) {
            return Err(format!("duplicate claim name '{name}'"));
        }
    }
    Ok(())
}
