//! Error types for conversions and class registration.

use std::fmt;

use thiserror::Error;

use crate::cbor::CborError;
use crate::custom::ObjectError;

/// Which side of the native model a conversion was heading to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// native -> intermediate
    Encoding,
    /// intermediate -> native
    Decoding,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encoding => write!(f, "encoding"),
            Direction::Decoding => write!(f, "decoding"),
        }
    }
}

/// Errors produced by any of the conversions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported type for native {direction}: {type_name}")]
    UnsupportedType {
        direction: Direction,
        type_name: String,
    },
    #[error("cannot encode a recursively linked structure")]
    CyclicStructure,
    #[error("$type \"{type_tag}\" is not supported")]
    UnsupportedTag { type_tag: String },
    #[error("value of type {type_name} is not JSONable")]
    NotJsonSafe { type_name: String },
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("malformed \"{type_tag}\" value: {reason}")]
    MalformedValue { type_tag: String, reason: String },
    #[error("class tag \"{class_tag}\" rejected its values: {source}")]
    InvalidObjectValues {
        class_tag: String,
        #[source]
        source: ObjectError,
    },
    #[error("value nesting exceeds the limit of {limit} levels")]
    DepthLimitExceeded { limit: usize },
    #[error(transparent)]
    Cbor(#[from] CborError),
}

impl Error {
    pub(crate) fn malformed(type_tag: &str, reason: impl fmt::Display) -> Self {
        Error::MalformedValue {
            type_tag: type_tag.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Reasons a class can be refused by the class-tag registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Class tag is not defined for class {class}")]
    MissingClassTag { class: String },
    #[error("Registering class tags that start with \"~\" sign is prohibited (class {class}, tag \"{class_tag}\")")]
    ReservedPrefix { class: String, class_tag: String },
    #[error("Cannot register {class} with class tag \"{class_tag}\" because this tag is already used for {existing}")]
    Conflict {
        class: String,
        class_tag: String,
        existing: String,
    },
}

/// Failure to read a scalar kind from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid decimal literal {0:?}")]
    Decimal(String),
    #[error("expected \"numerator/denominator\", got {0:?}")]
    Fraction(String),
    #[error("zero denominator in {0:?}")]
    ZeroDenominator(String),
    #[error("expected \"address/prefix\", got {0:?}")]
    IpNetwork(String),
    #[error("prefix length out of range in {0:?}")]
    PrefixTooLong(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
