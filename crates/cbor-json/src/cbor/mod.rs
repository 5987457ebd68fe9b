//! Canonical CBOR (RFC 8949) encoding and decoding of the intermediate model.

mod constants;
mod decoder;
mod encoder;
mod error;

pub use constants::*;
pub use decoder::{decode, CborDecoder};
pub use encoder::{encode, CborEncoder};
pub use error::CborError;
