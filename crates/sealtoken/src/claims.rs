//! Claim values and parsed token claims.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::id::TokenId;

/// Claims keyed by name. Parsed claims keep the key version's claim order.
pub type Claims = IndexMap<String, ClaimValue>;

/// A single application-defined claim value.
///
/// Only primitive values and binary blobs are carried. Binary data always
/// decodes to [`ClaimValue::Bytes`], whichever representation the codec
/// produced, so comparisons on decoded values are stable.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    Nil,
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`; smaller values use `Int`.
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl ClaimValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for ClaimValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::UInt(value),
        }
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<u8>> for ClaimValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for ClaimValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl Serialize for ClaimValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_bytes(v),
        }
    }
}

impl<'de> Deserialize<'de> for ClaimValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ClaimValueVisitor)
    }
}

struct ClaimValueVisitor;

impl<'de> Visitor<'de> for ClaimValueVisitor {
    type Value = ClaimValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a nil, boolean, number, string or binary value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Nil)
    }

    fn visit_none<E: de::Error>(self) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Nil)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ClaimValue, E> {
        Ok(ClaimValue::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ClaimValue, E> {
        Ok(ClaimValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ClaimValue, E> {
        Ok(ClaimValue::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<ClaimValue, E> {
        Ok(ClaimValue::Bytes(v))
    }
}

/// Claims recovered from a valid token.
///
/// Produced by [`TokenService::parse`](crate::TokenService::parse), either
/// freshly decrypted or served from the validated cache. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClaims {
    /// Unique token identifier.
    pub id: TokenId,

    /// Issue time (Unix timestamp) taken from the identifier.
    pub created_at: i64,

    /// Expiration time (Unix timestamp).
    pub expires_at: i64,

    /// Application claims in the deciding key version's order.
    pub claims: Claims,
}

impl ParsedClaims {
    /// Returns a claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    /// Returns `true` if the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at < now
    }
}
