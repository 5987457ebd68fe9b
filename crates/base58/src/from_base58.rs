//! Base58 decoding.

use crate::constants::{DIGITS, SENTINEL};
use crate::Base58Error;

/// Decodes base58 text produced by [`to_base58`](crate::to_base58).
///
/// The leading [`SENTINEL`] byte is verified and discarded. Both the empty
/// string and the bare sentinel (`"2"`) decode to an empty vector.
///
/// # Example
///
/// ```
/// use cbor_json_base58::from_base58;
///
/// assert_eq!(from_base58("2YNR2iFvLBFA62Pm").unwrap(), b"hello world");
/// assert!(from_base58("0OIl").is_err());
/// ```
pub fn from_base58(encoded: &str) -> Result<Vec<u8>, Base58Error> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    // Little-endian bytes of the running integer.
    let mut bytes: Vec<u8> = Vec::with_capacity(encoded.len() * 733 / 1000 + 1);
    for (index, ch) in encoded.chars().enumerate() {
        let digit = if ch.is_ascii() {
            DIGITS[ch as usize]
        } else {
            0xff
        };
        if digit == 0xff {
            return Err(Base58Error::InvalidCharacter { ch, index });
        }
        let mut carry = digit as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    // Leading zero digits add nothing to the integer value.
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    if bytes.pop() != Some(SENTINEL) {
        return Err(Base58Error::MissingSentinel);
    }
    bytes.reverse();
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_sentinel_is_empty() {
        assert_eq!(from_base58("2").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_payload_without_sentinel() {
        // "5" is the integer 4.
        assert_eq!(from_base58("5"), Err(Base58Error::MissingSentinel));
    }

    #[test]
    fn reports_offending_character() {
        assert_eq!(
            from_base58("5R0"),
            Err(Base58Error::InvalidCharacter { ch: '0', index: 2 })
        );
        assert!(matches!(
            from_base58("5Ré"),
            Err(Base58Error::InvalidCharacter { ch: 'é', index: 2 })
        ));
    }
}
