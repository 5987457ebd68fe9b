//! Base58 encoding.

use crate::constants::{ALPHABET_BYTES, SENTINEL};

/// Encodes a byte slice to base58 text.
///
/// The input is prefixed with [`SENTINEL`] and read as a big-endian integer,
/// so `[0x00, 0xab]` and `[0xab]` produce different text. The empty slice
/// encodes to the empty string.
///
/// # Example
///
/// ```
/// use cbor_json_base58::to_base58;
///
/// assert_eq!(to_base58(b"a"), "76");
/// assert_eq!(to_base58(b"\x00"), "5R");
/// assert_eq!(to_base58(b""), "");
/// ```
pub fn to_base58(uint8: &[u8]) -> String {
    if uint8.is_empty() {
        return String::new();
    }

    // Little-endian base-58 digits of the running integer.
    let mut digits: Vec<u8> = Vec::with_capacity(uint8.len() * 138 / 100 + 2);
    for &byte in std::iter::once(&SENTINEL).chain(uint8) {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    digits
        .iter()
        .rev()
        .map(|&d| ALPHABET_BYTES[d as usize] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_keeps_leading_zeros() {
        assert_eq!(to_base58(&[0x00]), "5R");
        assert_eq!(to_base58(&[0x00, 0x00]), "LUw");
        assert_ne!(to_base58(&[0x00, 0x61]), to_base58(&[0x61]));
    }

    #[test]
    fn output_never_starts_with_zero_digit() {
        for len in 1..40 {
            let text = to_base58(&vec![0u8; len]);
            assert!(!text.starts_with('1'), "len={len} text={text}");
        }
    }
}
