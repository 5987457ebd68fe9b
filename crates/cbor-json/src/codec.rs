//! The six directional conversions.
//!
//! Free functions use [`ConversionOptions::default`]; [`CborJsonCodec`]
//! carries custom options through every call.

use serde_json::Value;

use crate::cbor::{self, CborError};
use crate::convert::jsonable::{intermediate_to_jsonable, jsonable_to_intermediate};
use crate::convert::native::{intermediate_to_native, native_to_intermediate};
use crate::convert::ConversionOptions;
use crate::error::{Error, Result};
use crate::native::NativeValue;

#[derive(Debug, Clone, Copy, Default)]
pub struct CborJsonCodec {
    options: ConversionOptions,
}

impl CborJsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Native value to canonical CBOR bytes.
    pub fn cbor_from_native(&self, value: &NativeValue) -> Result<Vec<u8>> {
        let intermediate = native_to_intermediate(value, &self.options)?;
        Ok(cbor::encode(&intermediate))
    }

    /// CBOR bytes to a native value.
    pub fn native_from_cbor(&self, bytes: &[u8]) -> Result<NativeValue> {
        let intermediate = self.decode_cbor(bytes)?;
        intermediate_to_native(intermediate, &self.options)
    }

    /// Native value to a JSON-safe value.
    pub fn jsonable_from_native(&self, value: &NativeValue) -> Result<Value> {
        let intermediate = native_to_intermediate(value, &self.options)?;
        intermediate_to_jsonable(&intermediate, &self.options)
    }

    /// JSON-safe value to a native value.
    pub fn native_from_jsonable(&self, value: &Value) -> Result<NativeValue> {
        let intermediate = jsonable_to_intermediate(value, &self.options)?;
        intermediate_to_native(intermediate, &self.options)
    }

    /// JSON-safe value straight to CBOR bytes; custom objects stay in their
    /// tag 27 form and need not be registered.
    pub fn cbor_from_jsonable(&self, value: &Value) -> Result<Vec<u8>> {
        let intermediate = jsonable_to_intermediate(value, &self.options)?;
        Ok(cbor::encode(&intermediate))
    }

    /// CBOR bytes straight to a JSON-safe value.
    pub fn jsonable_from_cbor(&self, bytes: &[u8]) -> Result<Value> {
        let intermediate = self.decode_cbor(bytes)?;
        intermediate_to_jsonable(&intermediate, &self.options)
    }

    fn decode_cbor(&self, bytes: &[u8]) -> Result<crate::CborValue> {
        cbor::decode(bytes, self.options.max_depth).map_err(|err| match err {
            CborError::DepthLimit(limit) => Error::DepthLimitExceeded { limit },
            other => Error::Cbor(other),
        })
    }
}

pub fn cbor_from_native(value: &NativeValue) -> Result<Vec<u8>> {
    CborJsonCodec::new().cbor_from_native(value)
}

pub fn native_from_cbor(bytes: &[u8]) -> Result<NativeValue> {
    CborJsonCodec::new().native_from_cbor(bytes)
}

pub fn jsonable_from_native(value: &NativeValue) -> Result<Value> {
    CborJsonCodec::new().jsonable_from_native(value)
}

pub fn native_from_jsonable(value: &Value) -> Result<NativeValue> {
    CborJsonCodec::new().native_from_jsonable(value)
}

pub fn cbor_from_jsonable(value: &Value) -> Result<Vec<u8>> {
    CborJsonCodec::new().cbor_from_jsonable(value)
}

pub fn jsonable_from_cbor(bytes: &[u8]) -> Result<Value> {
    CborJsonCodec::new().jsonable_from_cbor(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cbor_errors_are_wrapped() {
        assert!(matches!(
            native_from_cbor(&[0x18]),
            Err(Error::Cbor(CborError::UnexpectedEof(1)))
        ));
        let codec = CborJsonCodec::with_options(ConversionOptions::new().max_depth(1));
        assert!(matches!(
            codec.jsonable_from_cbor(&[0x81, 0x81, 0x00]),
            Err(Error::DepthLimitExceeded { limit: 1 })
        ));
    }

    #[test]
    fn jsonable_and_cbor_agree() {
        let json = json!({"a": [1, 2.5, {"$type": "undefined"}], "b": null});
        let bytes = cbor_from_jsonable(&json).unwrap();
        assert_eq!(jsonable_from_cbor(&bytes).unwrap(), json);
        let native = native_from_jsonable(&json).unwrap();
        assert_eq!(cbor_from_native(&native).unwrap(), bytes);
        assert_eq!(jsonable_from_native(&native).unwrap(), json);
    }
}
