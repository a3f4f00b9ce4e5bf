//! Token lifecycle error types.
//!
//! Every failure a caller can observe from [`TokenService`](crate::TokenService)
//! is a distinct [`TokenError`] variant, so callers can discriminate
//! programmatically instead of inspecting messages.

use std::fmt;

use crate::config::ConfigError;

/// Errors that can occur while issuing, parsing, or revoking tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No key versions are configured, or the configuration is otherwise invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A claim required by the active key version was not supplied on create.
    #[error("Missing required claim: {name}")]
    MissingClaim {
        /// Name of the missing claim.
        name: String,
    },

    /// The token text could not be decoded.
    #[error("Malformed token: {reason}")]
    MalformedToken {
        /// Why decoding failed.
        reason: String,
    },

    /// The decrypted payload is not a valid token tuple.
    #[error("Malformed payload: {reason}")]
    MalformedPayload {
        /// Why payload decoding failed.
        reason: String,
    },

    /// None of the configured key versions can decrypt the token.
    #[error("Token cannot be decrypted by any configured key version")]
    InvalidVersion,

    /// The token has expired.
    #[error("Token expired at {expired_at}, current time is {now}")]
    Expired {
        /// Expiration of the token (Unix timestamp).
        expired_at: i64,
        /// Time of the check (Unix timestamp).
        now: i64,
    },

    /// The token has been explicitly revoked.
    #[error("Token revoked")]
    Revoked,

    /// The revocation store could not be reached or returned an error.
    #[error("Revocation store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl TokenError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(name: impl Into<String>) -> Self {
        Self::MissingClaim { name: name.into() }
    }

    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed_token(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Creates a new `MalformedPayload` error.
    #[must_use]
    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Creates a new `StoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error describes an unusable token rather than a
    /// failure of the system itself.
    ///
    /// These are the kinds `revoke` treats as "nothing to revoke".
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::MalformedPayload { .. }
                | Self::InvalidVersion
                | Self::Expired { .. }
                | Self::Revoked
        )
    }

    /// Returns `true` if this is an infrastructure failure.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::MissingClaim { .. } => ErrorCategory::Validation,
            Self::MalformedToken { .. } => ErrorCategory::Token,
            Self::MalformedPayload { .. } => ErrorCategory::Token,
            Self::InvalidVersion => ErrorCategory::Token,
            Self::Expired { .. } => ErrorCategory::Token,
            Self::Revoked => ErrorCategory::Token,
            Self::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<ConfigError> for TokenError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

/// Categories of token errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The presented token is unusable (malformed, foreign, expired, revoked).
    Token,
    /// Caller-supplied input was rejected.
    Validation,
    /// The revocation store failed.
    Infrastructure,
    /// The service is misconfigured.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
