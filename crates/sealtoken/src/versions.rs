//! Key version table.
//!
//! Tokens carry no version tag. The table is an ordered list of key
//! versions: the head seals every new token, and parsing tries each version
//! in order until one authenticates the ciphertext. The cost is a short
//! linear probe over active and retired keys, and the benefit is that key
//! rotation never invalidates tokens already issued.

use crate::TokenResult;
use crate::cipher::{Cipher, EncryptionKey};
use crate::config::{KeyVersionConfig, validate_claim_names};
use crate::error::TokenError;

/// One generation of encryption key plus its ordered claim schema.
#[derive(Debug, Clone)]
pub struct KeyVersion {
    key: EncryptionKey,
    claims: Vec<String>,
}

impl KeyVersion {
    /// Creates a key version.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if a claim name is empty or
    /// appears twice.
    pub fn new(key: EncryptionKey, claims: Vec<String>) -> TokenResult<Self> {
        validate_claim_names(&claims).map_err(TokenError::configuration)?;
        Ok(Self { key, claims })
    }

    /// Builds a key version from its configuration entry.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` for an undecodable key or an
    /// invalid claim list.
    pub fn from_config(config: &KeyVersionConfig) -> TokenResult<Self> {
        let key = EncryptionKey::parse(&config.key)?;
        Self::new(key, config.claims.clone())
    }

    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// Claim names in payload order.
    pub fn claims(&self) -> &[String] {
        &self.claims
    }
}

/// Ordered list of key versions, newest first.
#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    versions: Vec<KeyVersion>,
}

impl VersionTable {
    /// Creates a table; the first version is the active one.
    #[must_use]
    pub fn new(versions: Vec<KeyVersion>) -> Self {
        Self { versions }
    }

    /// Builds a table from configuration entries, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if any entry is invalid.
    pub fn from_config(configs: &[KeyVersionConfig]) -> TokenResult<Self> {
        let versions = configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                KeyVersion::from_config(config).map_err(|e| {
                    TokenError::configuration(format!("key version {index}: {e}"))
                })
            })
            .collect::<TokenResult<Vec<_>>>()?;
        Ok(Self::new(versions))
    }

    /// Returns a table with `version` prepended as the new active version.
    #[must_use]
    pub fn rotate(mut self, version: KeyVersion) -> Self {
        self.versions.insert(0, version);
        self
    }

    /// Returns the active version used for new tokens.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if no versions are configured.
    pub fn current(&self) -> TokenResult<&KeyVersion> {
        self.versions
            .first()
            .ok_or_else(|| TokenError::configuration("no key versions configured"))
    }

    /// Decrypts `ciphertext` with the first version whose key authenticates it.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidVersion` if no configured key succeeds.
    pub fn decrypt(
        &self,
        cipher: &dyn Cipher,
        ciphertext: &[u8],
    ) -> TokenResult<(Vec<u8>, &KeyVersion)> {
        self.versions
            .iter()
            .enumerate()
            .find_map(|(index, version)| {
                cipher.decrypt(ciphertext, &version.key).ok().map(|plaintext| {
                    tracing::trace!(version = index, "token decrypted");
                    (plaintext, version)
                })
            })
            .ok_or(TokenError::InvalidVersion)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
