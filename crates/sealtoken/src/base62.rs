//! Base-62 text transport encoding.
//!
//! Sealed tokens are binary; this module maps them to and from a printable
//! string over the alphabet `0-9a-zA-Z` by radix conversion. Leading zero
//! bytes are carried as leading `'0'` characters so every byte sequence
//! round-trips exactly.

use crate::TokenResult;
use crate::error::TokenError;

/// Digit alphabet, in value order.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longest token text accepted by [`decode`].
///
/// Radix conversion is quadratic in the input length, so oversize input is
/// rejected before any digit is processed.
pub const MAX_ENCODED_LEN: usize = 8192;

const BASE: u32 = 62;

/// Encodes bytes as a base-62 string.
#[must_use]
pub fn encode(input: &[u8]) -> String {
    let zeros = input.iter().take_while(|&&b| b == 0).count();

    // Base-62 digits, least significant first
    let mut digits: Vec<u8> = Vec::with_capacity((input.len() - zeros) * 138 / 100 + 1);
    for &byte in &input[zeros..] {
        let mut carry = u32::from(byte);
        for digit in &mut digits {
            carry += u32::from(*digit) << 8;
            *digit = (carry % BASE) as u8;
            carry /= BASE;
        }
        while carry > 0 {
            digits.push((carry % BASE) as u8);
            carry /= BASE;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat_n(ALPHABET[0] as char, zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

/// Decodes a base-62 string.
///
/// # Errors
///
/// Returns `TokenError::MalformedToken` for empty input, input longer than
/// [`MAX_ENCODED_LEN`], or any character outside [`ALPHABET`].
pub fn decode(input: &str) -> TokenResult<Vec<u8>> {
    if input.is_empty() {
        return Err(TokenError::malformed_token("empty token"));
    }
    if input.len() > MAX_ENCODED_LEN {
        return Err(TokenError::malformed_token(format!(
            "token is {} characters, limit is {MAX_ENCODED_LEN}",
            input.len()
        )));
    }

    let chars = input.as_bytes();
    let zeros = chars.iter().take_while(|&&c| c == ALPHABET[0]).count();

    // Base-256 bytes, least significant first
    let mut bytes: Vec<u8> = Vec::with_capacity(chars.len());
    for (position, &c) in chars.iter().enumerate().skip(zeros) {
        let value = digit_value(c).ok_or_else(|| {
            TokenError::malformed_token(format!("invalid character at position {position}"))
        })?;

        let mut carry = u32::from(value);
        for byte in &mut bytes {
            carry += u32::from(*byte) * BASE;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

fn digit_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'z' => Some(c - b'a' + 10),
        b'A'..=b'Z' => Some(c - b'A' + 36),
        _ => None,
    }
}
