//! Base58 encoding and decoding with a leading sentinel byte.
//!
//! Uses the Bitcoin alphabet. Before encoding, the byte `0x01` is prepended
//! to the input so that leading zero bytes survive the trip through a
//! big-endian integer; decoding strips it again.
//!
//! # Example
//!
//! ```
//! use cbor_json_base58::{from_base58, to_base58};
//!
//! let encoded = to_base58(b"\x00\x00ab");
//! let decoded = from_base58(&encoded).unwrap();
//! assert_eq!(decoded, b"\x00\x00ab");
//! ```

mod constants;
mod from_base58;
mod to_base58;

pub use constants::{ALPHABET, ALPHABET_BYTES, SENTINEL};
pub use from_base58::from_base58;
pub use to_base58::to_base58;

/// Error type for base58 operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base58Error {
    /// The input contains a character outside the base58 alphabet.
    InvalidCharacter { ch: char, index: usize },
    /// The decoded integer does not start with the sentinel byte.
    MissingSentinel,
}

impl std::fmt::Display for Base58Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Base58Error::InvalidCharacter { ch, index } => {
                write!(f, "invalid base58 character {ch:?} at position {index}")
            }
            Base58Error::MissingSentinel => write!(f, "base58 payload lacks the 0x01 sentinel"),
        }
    }
}

impl std::error::Error for Base58Error {}
