//! Authenticated encryption of token payloads.
//!
//! [`Cipher`] is the seam for the sealing primitive. The production
//! implementation is [`Aes256GcmCipher`]: AES-256-GCM with a random 96-bit
//! nonce prefixed to the ciphertext. Decryption with the wrong key, or of a
//! tampered ciphertext, fails authentication, which is what lets the version
//! table probe keys without a version tag on the wire.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

use crate::TokenResult;
use crate::config::ConfigError;
use crate::error::TokenError;

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// GCM authentication tag size
const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generates a random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses a key from a hex or base64 string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the string is neither encoding
    /// or does not decode to exactly 32 bytes.
    pub fn parse(key_str: &str) -> Result<Self, ConfigError> {
        let key_str = key_str.trim();

        // Try hex first
        if key_str.len() == KEY_SIZE * 2
            && let Ok(bytes) = hex::decode(key_str)
        {
            return Self::from_slice(&bytes);
        }

        let bytes = BASE64
            .decode(key_str)
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid base64 key: {e}")))?;
        Self::from_slice(&bytes)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            ConfigError::InvalidValue(format!(
                "Key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Authentication failed: wrong key, truncated or tampered ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ciphertext failed authentication")]
pub struct DecryptError;

/// Authenticated symmetric encryption.
pub trait Cipher: Send + Sync {
    /// Seals `plaintext` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Internal` if the primitive fails.
    fn encrypt(&self, plaintext: &[u8], key: &EncryptionKey) -> TokenResult<Vec<u8>>;

    /// Opens a sealed buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError`] if authentication fails for any reason.
    fn decrypt(&self, ciphertext: &[u8], key: &EncryptionKey) -> Result<Vec<u8>, DecryptError>;
}

/// AES-256-GCM; output layout is `nonce || ciphertext || tag`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

impl Cipher for Aes256GcmCipher {
    fn encrypt(&self, plaintext: &[u8], key: &EncryptionKey) -> TokenResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| TokenError::internal(format!("Failed to create cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| TokenError::internal(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &EncryptionKey) -> Result<Vec<u8>, DecryptError> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(DecryptError);
        }

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| DecryptError)?;
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| DecryptError)
    }
}
