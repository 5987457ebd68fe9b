//! Lossless conversion between native values, canonical CBOR and JSON.
//!
//! Three value models are involved:
//!
//! - [`NativeValue`]: the in-memory model, with shared mutable containers
//!   and user-defined [custom objects](custom).
//! - [`CborValue`]: the intermediate model, mirroring CBOR's value space.
//!   Every conversion passes through it.
//! - jsonable values: [`serde_json::Value`] trees in which anything plain
//!   JSON cannot express is wrapped as `{"$type": ..., "$value": ...}`.
//!
//! ```
//! use cbor_json::{jsonable_from_native, native_from_jsonable, NativeValue};
//! use serde_json::json;
//!
//! let value = NativeValue::list(vec![
//!     NativeValue::Bytes(vec![1, 2, 3]),
//!     NativeValue::Date("2024-05-01".parse().unwrap()),
//! ]);
//! let json = jsonable_from_native(&value).unwrap();
//! assert_eq!(
//!     json,
//!     json!([
//!         {"$type": "binary-hex", "$value": "010203"},
//!         {"$type": "date", "$value": "2024-05-01"},
//!     ])
//! );
//! assert_eq!(native_from_jsonable(&json).unwrap(), value);
//! ```

pub mod cbor;
pub mod codec;
pub mod collections;
pub mod convert;
pub mod custom;
pub mod decimal;
pub mod error;
pub mod fraction;
pub mod intermediate;
pub mod native;
pub mod values;

pub use codec::{
    cbor_from_jsonable, cbor_from_native, jsonable_from_cbor, jsonable_from_native,
    native_from_cbor, native_from_jsonable, CborJsonCodec,
};
pub use collections::{Map, Set};
pub use convert::{ConversionOptions, DEFAULT_MAX_DEPTH};
pub use custom::{CustomClass, ObjectError, UnrecognizedObject};
pub use decimal::Decimal;
pub use error::{Direction, Error, ParseError, RegistrationError, Result};
pub use fraction::Fraction;
pub use intermediate::{CborValue, Tagged};
pub use native::NativeValue;
pub use values::{IpNetwork, MimeMessage, Pattern, SimpleValue};
