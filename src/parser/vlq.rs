//! Encoded trace format.
//!
//! A trace is a run of base64url VLQ numbers, one image-relative
//! instruction address each. Every character carries 5 data bits; bit 6
//! marks a continuation. The lowest bit of the assembled value is the sign.
//!
//! Reporters write each offset as a signed 32-bit value, so a frame below
//! the image base (a system library, say) arrives negative. Such offsets
//! are kept; engines resolve them to an empty frame group.

use crate::utils::error::EngineError;

const BASE64_URL: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const CONTINUATION: u8 = 0b10_0000;
const DATA_MASK: u8 = 0b1_1111;

/// Enough for 32 magnitude bits plus the sign bit
const MAX_DIGITS: usize = 7;

fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

fn decode_error(position: usize, reason: impl Into<String>) -> EngineError {
    EngineError::TraceDecode {
        position,
        reason: reason.into(),
    }
}

/// Decode an encoded trace into signed image-relative offsets
///
/// **Public** - used by engines that work on raw addresses
///
/// # Errors
/// * `EngineError::TraceDecode` - empty input, a byte outside the
///   alphabet, a dangling continuation or a magnitude over 32 bits
pub fn decode_addresses(encoded: &str) -> Result<Vec<i64>, EngineError> {
    let bytes = encoded.as_bytes();
    if bytes.is_empty() {
        return Err(decode_error(0, "empty trace"));
    }

    let mut addresses = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let mut value: u64 = 0;
        let mut digits = 0;

        loop {
            let Some(&byte) = bytes.get(pos) else {
                return Err(decode_error(pos, "trace ends inside a number"));
            };
            let digit = digit_value(byte)
                .ok_or_else(|| decode_error(pos, format!("invalid character {:?}", byte as char)))?;

            if digits == MAX_DIGITS {
                return Err(decode_error(start, "number too large"));
            }

            value |= u64::from(digit & DATA_MASK) << (5 * digits);
            digits += 1;
            pos += 1;

            if digit & CONTINUATION == 0 {
                break;
            }
        }

        let magnitude = u32::try_from(value >> 1)
            .map_err(|_| decode_error(start, "address exceeds 32 bits"))?;
        let offset = i64::from(magnitude);
        addresses.push(if value & 1 == 1 { -offset } else { offset });
    }

    Ok(addresses)
}

/// Encode offsets in the trace format
///
/// Magnitudes above 32 bits are truncated.
pub fn encode_addresses(addresses: &[i64]) -> String {
    let mut out = String::new();

    for &address in addresses {
        let magnitude = u64::from(address.unsigned_abs() as u32);
        let mut vlq = (magnitude << 1) | u64::from(address < 0);
        loop {
            let mut digit = (vlq & u64::from(DATA_MASK)) as u8;
            vlq >>= 5;
            if vlq != 0 {
                digit |= CONTINUATION;
            }
            out.push(BASE64_URL[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    out
}
