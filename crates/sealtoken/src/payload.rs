//! Token payload codec.
//!
//! A payload is the flat MessagePack array `[id, expires_at, claim_0, ...]`.
//! The trailing values are positional: their meaning comes from the claim
//! order of the key version that sealed the token. The codec itself carries
//! no version information.

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::TokenResult;
use crate::claims::ClaimValue;
use crate::error::TokenError;
use crate::id::{TOKEN_ID_LEN, TokenId};

/// Number of fixed leading elements (identifier and expiry).
const HEADER_LEN: usize = 2;

/// A decoded payload tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub id: TokenId,
    pub expires_at: i64,
    pub claims: Vec<ClaimValue>,
}

/// Borrowed payload, serialized as a single flat array.
struct PayloadRef<'a> {
    id: &'a TokenId,
    expires_at: i64,
    claims: &'a [&'a ClaimValue],
}

impl Serialize for PayloadRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(HEADER_LEN + self.claims.len()))?;
        seq.serialize_element(&RawBytes(self.id.as_bytes()))?;
        seq.serialize_element(&self.expires_at)?;
        for claim in self.claims {
            seq.serialize_element(claim)?;
        }
        seq.end()
    }
}

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

/// Serializes a payload tuple.
///
/// # Errors
///
/// Returns `TokenError::Internal` if serialization fails.
pub fn encode(id: &TokenId, expires_at: i64, claims: &[&ClaimValue]) -> TokenResult<Vec<u8>> {
    let payload = PayloadRef {
        id,
        expires_at,
        claims,
    };
    rmp_serde::to_vec(&payload)
        .map_err(|e| TokenError::internal(format!("Failed to encode payload: {e}")))
}

/// Deserializes a payload tuple.
///
/// # Errors
///
/// Returns `TokenError::MalformedPayload` if the blob is not an array, has
/// fewer than two elements, or its identifier/expiry have the wrong type.
pub fn decode(blob: &[u8]) -> TokenResult<DecodedPayload> {
    let values: Vec<ClaimValue> = rmp_serde::from_slice(blob)
        .map_err(|e| TokenError::malformed_payload(e.to_string()))?;

    if values.len() < HEADER_LEN {
        return Err(TokenError::malformed_payload(format!(
            "expected at least {HEADER_LEN} elements, got {}",
            values.len()
        )));
    }

    let mut values = values.into_iter();

    let id = match values.next() {
        Some(ClaimValue::Bytes(bytes)) => TokenId::from_slice(&bytes).ok_or_else(|| {
            TokenError::malformed_payload(format!(
                "identifier must be {TOKEN_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?,
        _ => return Err(TokenError::malformed_payload("identifier must be binary")),
    };

    let expires_at = match values.next() {
        Some(ClaimValue::Int(ts)) => ts,
        _ => return Err(TokenError::malformed_payload("expiry must be an integer")),
    };

    Ok(DecodedPayload {
        id,
        expires_at,
        claims: values.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_id() -> TokenId {
        TokenId::from_bytes([
            0x01, 0x8f, 0x3a, 0x00, 0x00, 0x00, 0x70, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x2a,
        ])
    }

    #[test]
    fn test_encode_decode_mixed_claims() {
        let claims = [
            ClaimValue::from("alice"),
            ClaimValue::from(42),
            ClaimValue::from(-7),
            ClaimValue::from(true),
            ClaimValue::Nil,
            ClaimValue::from(1.5),
            ClaimValue::from(vec![0u8, 1, 2, 255]),
            ClaimValue::from(u64::MAX),
        ];
        let refs: Vec<&ClaimValue> = claims.iter().collect();

        let blob = encode(&test_id(), 1_700_000_000, &refs).unwrap();
        let decoded = decode(&blob).unwrap();

        assert_eq!(decoded.id, test_id());
        assert_eq!(decoded.expires_at, 1_700_000_000);
        assert_eq!(decoded.claims, claims);
    }

    #[test]
    fn test_encoding_is_flat_array() {
        let blob = encode(&test_id(), 1, &[]).unwrap();
        // fixarray of two elements
        assert_eq!(blob[0], 0x92);
        // bin8 header with length 16
        assert_eq!(&blob[1..3], &[0xc4, 0x10]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let claim = ClaimValue::from("x");
        let a = encode(&test_id(), 5, &[&claim]).unwrap();
        let b = encode(&test_id(), 5, &[&claim]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(&[0xc1]).unwrap_err();
        assert!(matches!(err, TokenError::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let blob = rmp_serde::to_vec(&"just a string").unwrap();
        assert!(matches!(
            decode(&blob).unwrap_err(),
            TokenError::MalformedPayload { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_short_tuple() {
        let blob = rmp_serde::to_vec(&vec![ClaimValue::Bytes(vec![0; 16])]).unwrap();
        let err = decode(&blob).unwrap_err();
        assert!(err.to_string().contains("at least 2 elements"));
    }

    #[test]
    fn test_decode_rejects_wrong_id_width() {
        let blob = rmp_serde::to_vec(&vec![ClaimValue::Bytes(vec![0; 8]), ClaimValue::Int(1)])
            .unwrap();
        let err = decode(&blob).unwrap_err();
        assert!(err.to_string().contains("16 bytes, got 8"));
    }

    #[test]
    fn test_decode_rejects_string_id() {
        let blob =
            rmp_serde::to_vec(&vec![ClaimValue::from("id"), ClaimValue::Int(1)]).unwrap();
        let err = decode(&blob).unwrap_err();
        assert!(err.to_string().contains("identifier must be binary"));
    }

    #[test]
    fn test_decode_rejects_non_integer_expiry() {
        let blob = rmp_serde::to_vec(&vec![
            ClaimValue::Bytes(vec![0; 16]),
            ClaimValue::from("tomorrow"),
        ])
        .unwrap();
        let err = decode(&blob).unwrap_err();
        assert!(err.to_string().contains("expiry must be an integer"));
    }
}
