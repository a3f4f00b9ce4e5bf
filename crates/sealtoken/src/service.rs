//! Token lifecycle service.
//!
//! [`TokenService`] issues, parses and revokes tokens by composing the key
//! version table, payload codec, base-62 transport encoding, revocation store
//! and validated-claims cache.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sealtoken::{Claims, ClaimValue, InMemoryRevocationStore, ParseOptions, TokenConfig, TokenService};
//!
//! let config = TokenConfig::from_toml_str(&source)?;
//! let service = TokenService::from_config(&config, Arc::new(InMemoryRevocationStore::new()))?;
//!
//! let mut claims = Claims::new();
//! claims.insert("user_id".into(), ClaimValue::from(42));
//! let token = service.create(&claims, Duration::from_secs(3600))?;
//!
//! let parsed = service.parse(&token, ParseOptions::default()).await?;
//! service.revoke(&token).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::TokenResult;
use crate::base62;
use crate::cache::ClaimsCache;
use crate::cipher::{Aes256GcmCipher, Cipher};
use crate::claims::{Claims, ParsedClaims};
use crate::clock::{Clock, SystemClock};
use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::id::{IdGenerator, UuidV7Generator};
use crate::payload;
use crate::store::{RevocationStore, revocation_set_key};
use crate::versions::VersionTable;

/// Options for [`TokenService::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip the revocation check. Claims parsed this way are never cached.
    pub skip_revocation_check: bool,
}

impl ParseOptions {
    /// Options that skip the revocation check.
    #[must_use]
    pub fn skip_revocation() -> Self {
        Self {
            skip_revocation_check: true,
        }
    }
}

/// Issues, parses and revokes sealed tokens.
pub struct TokenService {
    /// Key versions, newest first.
    versions: VersionTable,

    /// Revocation registry key for this namespace.
    revocation_key: String,

    /// Revocation registry backend.
    store: Arc<dyn RevocationStore>,

    /// Validated claims cache.
    cache: Arc<ClaimsCache>,

    cipher: Arc<dyn Cipher>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,

    /// Lifetime used by `create_default`.
    default_ttl: Duration,
}

impl TokenService {
    /// Starts building a service for `namespace`.
    #[must_use]
    pub fn builder(namespace: impl Into<String>) -> TokenServiceBuilder {
        TokenServiceBuilder::new(namespace)
    }

    /// Creates a service from validated configuration with the production
    /// cipher, identifier generator and clock.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the configuration is invalid.
    pub fn from_config(config: &TokenConfig, store: Arc<dyn RevocationStore>) -> TokenResult<Self> {
        config.validate()?;
        Self::builder(config.namespace.clone())
            .versions(VersionTable::from_config(&config.versions)?)
            .store(store)
            .cache(Arc::new(ClaimsCache::new(&config.cache)))
            .default_ttl(config.default_ttl)
            .build()
    }

    /// Issues a token for `claims` that expires `ttl` from now.
    ///
    /// Every claim named by the active key version must be present in
    /// `claims`; extra entries are ignored. Does not touch the cache or the
    /// revocation store.
    ///
    /// # Errors
    ///
    /// - `TokenError::Configuration` if no key versions are configured
    /// - `TokenError::MissingClaim` if a required claim is absent
    /// - `TokenError::Internal` if encoding or encryption fails, or the
    ///   claims are too large to fit in a parseable token
    pub fn create(&self, claims: &Claims, ttl: Duration) -> TokenResult<String> {
        let version = self.versions.current()?;

        let id = self.ids.generate();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = self.clock.unix_now().saturating_add(ttl_secs);

        let values = version
            .claims()
            .iter()
            .map(|name| {
                claims
                    .get(name)
                    .ok_or_else(|| TokenError::missing_claim(name.as_str()))
            })
            .collect::<TokenResult<Vec<_>>>()?;

        let payload = payload::encode(&id, expires_at, &values)?;
        let sealed = self.cipher.encrypt(&payload, version.key())?;

        let token = base62::encode(&sealed);
        if token.len() > base62::MAX_ENCODED_LEN {
            return Err(TokenError::internal(format!(
                "token is {} characters, limit is {}",
                token.len(),
                base62::MAX_ENCODED_LEN
            )));
        }

        debug!(token_id = %id, expires_at, "token created");
        Ok(token)
    }

    /// Issues a token with the configured default lifetime.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_default(&self, claims: &Claims) -> TokenResult<String> {
        self.create(claims, self.default_ttl)
    }

    /// Validates `token` and returns its claims.
    ///
    /// Cached tokens skip decryption and the revocation check; expiry is
    /// checked on every call. Freshly validated tokens are cached only after
    /// the revocation check has passed.
    ///
    /// # Errors
    ///
    /// - `TokenError::MalformedToken` if the text is not base-62
    /// - `TokenError::InvalidVersion` if no key version decrypts it
    /// - `TokenError::MalformedPayload` if the decrypted payload is invalid
    /// - `TokenError::Expired` if the token is past its expiry
    /// - `TokenError::Revoked` if the token has been revoked
    /// - `TokenError::StoreUnavailable` if the revocation check fails
    pub async fn parse(&self, token: &str, options: ParseOptions) -> TokenResult<Arc<ParsedClaims>> {
        let cached = self.cache.get(token).await;
        let from_cache = cached.is_some();

        let claims = match cached {
            Some(claims) => {
                debug!(token_id = %claims.id, "token served from cache");
                claims
            }
            None => Arc::new(self.open(token)?),
        };

        let now = self.clock.unix_now();
        if claims.is_expired_at(now) {
            if from_cache {
                self.cache.invalidate(token).await;
            }
            return Err(TokenError::Expired {
                expired_at: claims.expires_at,
                now,
            });
        }

        if from_cache || options.skip_revocation_check {
            return Ok(claims);
        }

        let revoked = self
            .store
            .check_and_prune(&self.revocation_key, &claims.id.revocation_key(), now)
            .await?;
        if revoked {
            debug!(token_id = %claims.id, "token is revoked");
            return Err(TokenError::Revoked);
        }

        if !self.cache.insert(token, Arc::clone(&claims)).await {
            debug!(token_id = %claims.id, "token revoked during validation, not cached");
        }
        Ok(claims)
    }

    /// Revokes `token` until its original expiry.
    ///
    /// Tokens that are already unusable (malformed, foreign, expired or
    /// revoked) have nothing to revoke and succeed without effect.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::StoreUnavailable` if the store cannot record the
    /// revocation, and propagates any other non-token error.
    pub async fn revoke(&self, token: &str) -> TokenResult<()> {
        let claims = match self.parse(token, ParseOptions::skip_revocation()).await {
            Ok(claims) => claims,
            Err(err) if err.is_token_error() => {
                debug!(error = %err, category = %err.category(), "nothing to revoke");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.store
            .add(
                &self.revocation_key,
                &claims.id.revocation_key(),
                claims.expires_at,
            )
            .await?;
        self.cache.evict_revoked(token, claims.id).await;

        debug!(token_id = %claims.id, expires_at = claims.expires_at, "token revoked");
        Ok(())
    }

    /// Decodes, decrypts and deserializes a token without any checks.
    fn open(&self, token: &str) -> TokenResult<ParsedClaims> {
        let sealed = base62::decode(token)?;
        let (plaintext, version) = self.versions.decrypt(self.cipher.as_ref(), &sealed)?;
        let decoded = payload::decode(&plaintext)?;

        if decoded.claims.len() != version.claims().len() {
            return Err(TokenError::malformed_payload(format!(
                "expected {} claims, got {}",
                version.claims().len(),
                decoded.claims.len()
            )));
        }

        let created_at = self.ids.timestamp(&decoded.id)?;
        let claims = version
            .claims()
            .iter()
            .cloned()
            .zip(decoded.claims)
            .collect::<Claims>();

        Ok(ParsedClaims {
            id: decoded.id,
            created_at,
            expires_at: decoded.expires_at,
            claims,
        })
    }

    /// Key versions in probe order.
    pub fn versions(&self) -> &VersionTable {
        &self.versions
    }

    /// Validated claims cache.
    pub fn cache(&self) -> &ClaimsCache {
        &self.cache
    }

    /// Revocation registry key for this service's namespace.
    pub fn revocation_key(&self) -> &str {
        &self.revocation_key
    }
}

/// Builder for [`TokenService`].
///
/// Store and key versions are required; cipher, identifier generator, clock
/// and cache default to the production implementations.
pub struct TokenServiceBuilder {
    namespace: String,
    versions: VersionTable,
    store: Option<Arc<dyn RevocationStore>>,
    cache: Option<Arc<ClaimsCache>>,
    cipher: Arc<dyn Cipher>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl TokenServiceBuilder {
    fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            versions: VersionTable::default(),
            store: None,
            cache: None,
            cipher: Arc::new(Aes256GcmCipher),
            ids: Arc::new(UuidV7Generator),
            clock: Arc::new(SystemClock),
            default_ttl: TokenConfig::default().default_ttl,
        }
    }

    #[must_use]
    pub fn versions(mut self, versions: VersionTable) -> Self {
        self.versions = versions;
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<ClaimsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    #[must_use]
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Builds the service.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the namespace is empty, no key
    /// versions were given, or no store was set.
    pub fn build(self) -> TokenResult<TokenService> {
        if self.namespace.is_empty() {
            return Err(TokenError::configuration("namespace cannot be empty"));
        }
        if self.versions.is_empty() {
            return Err(TokenError::configuration("no key versions configured"));
        }
        let store = self
            .store
            .ok_or_else(|| TokenError::configuration("revocation store is required"))?;

        Ok(TokenService {
            versions: self.versions,
            revocation_key: revocation_set_key(&self.namespace),
            store,
            cache: self.cache.unwrap_or_default(),
            cipher: self.cipher,
            ids: self.ids,
            clock: self.clock,
            default_ttl: self.default_ttl,
        })
    }
}
