//! Custom serializable objects.
//!
//! A type becomes serializable by implementing [`CustomClass`]: a short class
//! tag, an optional human-readable descriptor and a pair of functions moving
//! the object's state to and from a list of [`NativeValue`]s. Registering
//! the type with [`register`] lets decoding rebuild it from the tag.
//!
//! ```
//! use cbor_json::custom::{register, CustomClass, ObjectError};
//! use cbor_json::NativeValue;
//!
//! #[derive(Debug, Default)]
//! struct Point {
//!     x: i128,
//!     y: i128,
//! }
//!
//! impl CustomClass for Point {
//!     const CLASS_TAG: &'static str = "pt";
//!     const DESCRIPTOR: Option<&'static str> = Some("Point (x, y)");
//!
//!     fn values(&self) -> Vec<NativeValue> {
//!         vec![NativeValue::Integer(self.x), NativeValue::Integer(self.y)]
//!     }
//!
//!     fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError> {
//!         match values.as_slice() {
//!             [NativeValue::Integer(x), NativeValue::Integer(y)] => {
//!                 (self.x, self.y) = (*x, *y);
//!                 Ok(())
//!             }
//!             _ => Err(ObjectError::new("expected two integers")),
//!         }
//!     }
//! }
//!
//! register::<Point>().unwrap();
//! let bytes = cbor_json::cbor_from_native(&NativeValue::object(Point { x: 1, y: 2 })).unwrap();
//! let back = cbor_json::native_from_cbor(&bytes).unwrap();
//! assert_eq!(back.as_object::<Point>().unwrap().y, 2);
//! ```
//!
//! Types that do not implement the contract cannot be registered at all:
//!
//! ```compile_fail
//! #[derive(Debug, Default)]
//! struct NotSerializable;
//!
//! cbor_json::custom::register::<NotSerializable>().unwrap();
//! ```

pub mod builtin;
pub mod registry;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::native::NativeValue;

pub use registry::{describe, is_registered, lookup, register, ClassHandle};

/// Shared handle to a custom object inside a native tree.
pub type ObjectRef = Rc<RefCell<dyn SerializableObject>>;

/// Raised by [`CustomClass::set_values`] when the values do not fit the class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ObjectError(String);

impl ObjectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The serialization contract of a user-defined class.
pub trait CustomClass: fmt::Debug + Default + 'static {
    /// Process-wide unique tag. Keep it short; must not start with `~`.
    const CLASS_TAG: &'static str;
    /// Shown as `$class` in the jsonable form, e.g. `"Point (x, y)"`.
    const DESCRIPTOR: Option<&'static str> = None;

    /// Name used in registration errors.
    fn class_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// The object's state as a list of values.
    fn values(&self) -> Vec<NativeValue>;

    /// Restores state from the list produced by [`values`](Self::values).
    fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError>;
}

/// Object-safe view of a [`CustomClass`] instance.
pub trait SerializableObject: fmt::Debug {
    fn class_tag(&self) -> &str;
    fn values(&self) -> Vec<NativeValue>;
    fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: CustomClass> SerializableObject for T {
    fn class_tag(&self) -> &str {
        T::CLASS_TAG
    }

    fn values(&self) -> Vec<NativeValue> {
        CustomClass::values(self)
    }

    fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError> {
        CustomClass::set_values(self, values)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PartialEq for dyn SerializableObject {
    fn eq(&self, other: &Self) -> bool {
        self.class_tag() == other.class_tag() && self.values() == other.values()
    }
}

/// Placeholder for a custom object whose class tag is not registered.
///
/// Keeps the tag and values so the object re-encodes to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnrecognizedObject {
    pub class_tag: String,
    pub values: Vec<NativeValue>,
}

impl UnrecognizedObject {
    pub fn new(class_tag: impl Into<String>, values: Vec<NativeValue>) -> Self {
        Self {
            class_tag: class_tag.into(),
            values,
        }
    }
}
