//! The native value model.
//!
//! Mutable composites (`List`, `Map`, `Set`) and custom objects are shared
//! through `Rc<RefCell<..>>`, so a tree can alias a node in several places
//! or even contain itself. Conversions detect the latter and refuse it.
//!
//! Equality and hashing look through the shared cells at the contents. A
//! container used as a map key or set member must not be mutated while it
//! sits there.

use std::cell::{Ref, RefCell};
use std::hash::{Hash, Hasher};
use std::mem;
use std::net::IpAddr;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::collections::{Map, Set};
use crate::custom::{CustomClass, ObjectRef, UnrecognizedObject};
use crate::decimal::Decimal;
use crate::fraction::Fraction;
use crate::intermediate::Tagged;
use crate::values::{hash_float, IpNetwork, MimeMessage, Pattern, SimpleValue};

pub type ListRef = Rc<RefCell<Vec<NativeValue>>>;
pub type MapRef = Rc<RefCell<Map<NativeValue>>>;
pub type SetRef = Rc<RefCell<Set<NativeValue>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    /// Distinct from `Null`.
    Undefined,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(ListRef),
    Tuple(Vec<NativeValue>),
    Map(MapRef),
    FrozenMap(Map<NativeValue>),
    Set(SetRef),
    FrozenSet(Set<NativeValue>),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    Fraction(Fraction),
    Decimal(Decimal),
    Regex(Pattern),
    IpAddress(IpAddr),
    IpNetwork(IpNetwork),
    Mime(MimeMessage),
    Simple(SimpleValue),
    Tagged(Box<Tagged<NativeValue>>),
    Object(ObjectRef),
    /// A custom object whose class tag no registered class claims.
    Unrecognized(UnrecognizedObject),
}

impl Eq for NativeValue {}

impl Hash for NativeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            NativeValue::Null | NativeValue::Undefined => {}
            NativeValue::Bool(b) => b.hash(state),
            NativeValue::Integer(int) => int.hash(state),
            NativeValue::Float(float) => hash_float(*float, state),
            NativeValue::Text(s) => s.hash(state),
            NativeValue::Bytes(b) => b.hash(state),
            NativeValue::List(items) => items.borrow().hash(state),
            NativeValue::Tuple(items) => items.hash(state),
            NativeValue::Map(map) => map.borrow().hash(state),
            NativeValue::FrozenMap(map) => map.hash(state),
            NativeValue::Set(set) => set.borrow().hash(state),
            NativeValue::FrozenSet(set) => set.hash(state),
            NativeValue::Date(date) => date.hash(state),
            NativeValue::DateTime(dt) => dt.hash(state),
            NativeValue::Uuid(uuid) => uuid.hash(state),
            NativeValue::Fraction(fraction) => fraction.hash(state),
            NativeValue::Decimal(decimal) => decimal.hash(state),
            NativeValue::Regex(pattern) => pattern.hash(state),
            NativeValue::IpAddress(addr) => addr.hash(state),
            NativeValue::IpNetwork(network) => network.hash(state),
            NativeValue::Mime(message) => message.hash(state),
            NativeValue::Simple(simple) => simple.hash(state),
            NativeValue::Tagged(tagged) => tagged.hash(state),
            NativeValue::Object(object) => {
                let object = object.borrow();
                object.class_tag().hash(state);
                object.values().hash(state);
            }
            NativeValue::Unrecognized(object) => object.hash(state),
        }
    }
}

impl NativeValue {
    pub fn list(items: Vec<NativeValue>) -> Self {
        NativeValue::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(map: Map<NativeValue>) -> Self {
        NativeValue::Map(Rc::new(RefCell::new(map)))
    }

    pub fn set(set: Set<NativeValue>) -> Self {
        NativeValue::Set(Rc::new(RefCell::new(set)))
    }

    pub fn tagged(tag: u64, value: NativeValue) -> Self {
        NativeValue::Tagged(Box::new(Tagged::new(tag, value)))
    }

    pub fn text(s: impl Into<String>) -> Self {
        NativeValue::Text(s.into())
    }

    /// Wraps a custom object so it can be placed in a tree.
    pub fn object<T: CustomClass>(object: T) -> Self {
        let shared: ObjectRef = Rc::new(RefCell::new(object));
        NativeValue::Object(shared)
    }

    /// Borrows the custom object as `T` if this is an object of that class.
    pub fn as_object<T: CustomClass>(&self) -> Option<Ref<'_, T>> {
        match self {
            NativeValue::Object(obj) => {
                Ref::filter_map(obj.borrow(), |o| o.as_any().downcast_ref::<T>()).ok()
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            NativeValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a list or tuple, cloned out of any shared cell.
    pub fn sequence_items(&self) -> Option<Vec<NativeValue>> {
        match self {
            NativeValue::List(items) => Some(items.borrow().clone()),
            NativeValue::Tuple(items) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Undefined => "undefined",
            NativeValue::Bool(_) => "bool",
            NativeValue::Integer(_) => "integer",
            NativeValue::Float(_) => "float",
            NativeValue::Text(_) => "text",
            NativeValue::Bytes(_) => "bytes",
            NativeValue::List(_) => "list",
            NativeValue::Tuple(_) => "tuple",
            NativeValue::Map(_) => "map",
            NativeValue::FrozenMap(_) => "frozen map",
            NativeValue::Set(_) => "set",
            NativeValue::FrozenSet(_) => "frozen set",
            NativeValue::Date(_) => "date",
            NativeValue::DateTime(_) => "datetime",
            NativeValue::Uuid(_) => "uuid",
            NativeValue::Fraction(_) => "fraction",
            NativeValue::Decimal(_) => "decimal",
            NativeValue::Regex(_) => "regex",
            NativeValue::IpAddress(_) => "ip address",
            NativeValue::IpNetwork(_) => "ip network",
            NativeValue::Mime(_) => "mime message",
            NativeValue::Simple(_) => "simple value",
            NativeValue::Tagged(_) => "tagged value",
            NativeValue::Object(_) => "custom object",
            NativeValue::Unrecognized(_) => "unrecognized custom object",
        }
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Integer(i as i128)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Integer(i as i128)
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Float(f)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::Text(s.to_owned())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::Text(s)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(b: Vec<u8>) -> Self {
        NativeValue::Bytes(b)
    }
}

impl From<NaiveDate> for NativeValue {
    fn from(d: NaiveDate) -> Self {
        NativeValue::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for NativeValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        NativeValue::DateTime(dt)
    }
}

impl From<Uuid> for NativeValue {
    fn from(u: Uuid) -> Self {
        NativeValue::Uuid(u)
    }
}

impl From<Fraction> for NativeValue {
    fn from(f: Fraction) -> Self {
        NativeValue::Fraction(f)
    }
}

impl From<Decimal> for NativeValue {
    fn from(d: Decimal) -> Self {
        NativeValue::Decimal(d)
    }
}

impl From<IpAddr> for NativeValue {
    fn from(a: IpAddr) -> Self {
        NativeValue::IpAddress(a)
    }
}
