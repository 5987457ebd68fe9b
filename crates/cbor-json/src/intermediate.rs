//! The intermediate model: CBOR's value space, used as the hub of every conversion.

use std::hash::{Hash, Hasher};
use std::mem;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive};
use uuid::Uuid;

use crate::collections::{Map, Set};
use crate::decimal::Decimal;
use crate::fraction::Fraction;
use crate::values::{hash_float, IpNetwork, MimeMessage, Pattern, SimpleValue};

/// Reserved tag: calendar date as a day offset from 1970-01-01.
pub const TAG_DATE: u64 = 100;
/// Reserved tag: custom object as `[class_tag, ...values]`
/// (<http://cbor.schmorp.de/generic-object>).
pub const TAG_CUSTOM_OBJECT: u64 = 27;
/// Positive bignum.
pub const TAG_POS_BIGNUM: u64 = 2;
/// Negative bignum.
pub const TAG_NEG_BIGNUM: u64 = 3;

/// An integer tag paired with the value it wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tagged<V> {
    pub tag: u64,
    pub value: V,
}

impl<V> Tagged<V> {
    pub fn new(tag: u64, value: V) -> Self {
        Self { tag, value }
    }
}

/// Intermediate value. Dates and custom objects appear only in their
/// reserved-tag forms.
///
/// `Eq` and `Hash` follow `==`: floats compare numerically, so a NaN never
/// equals anything, itself included.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    Null,
    Undefined,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<CborValue>),
    Tuple(Vec<CborValue>),
    Map(Map<CborValue>),
    FrozenMap(Map<CborValue>),
    Set(Set<CborValue>),
    FrozenSet(Set<CborValue>),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    Fraction(Fraction),
    Decimal(Decimal),
    Regex(Pattern),
    IpAddress(IpAddr),
    IpNetwork(IpNetwork),
    Mime(MimeMessage),
    Simple(SimpleValue),
    Tagged(Box<Tagged<CborValue>>),
}

impl Eq for CborValue {}

impl Hash for CborValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            CborValue::Null | CborValue::Undefined => {}
            CborValue::Bool(b) => b.hash(state),
            CborValue::Integer(int) => int.hash(state),
            CborValue::Float(float) => hash_float(*float, state),
            CborValue::Text(s) => s.hash(state),
            CborValue::Bytes(b) => b.hash(state),
            CborValue::Array(items) | CborValue::Tuple(items) => items.hash(state),
            CborValue::Map(map) | CborValue::FrozenMap(map) => map.hash(state),
            CborValue::Set(set) | CborValue::FrozenSet(set) => set.hash(state),
            CborValue::DateTime(dt) => dt.hash(state),
            CborValue::Uuid(uuid) => uuid.hash(state),
            CborValue::Fraction(fraction) => fraction.hash(state),
            CborValue::Decimal(decimal) => decimal.hash(state),
            CborValue::Regex(pattern) => pattern.hash(state),
            CborValue::IpAddress(addr) => addr.hash(state),
            CborValue::IpNetwork(network) => network.hash(state),
            CborValue::Mime(message) => message.hash(state),
            CborValue::Simple(simple) => simple.hash(state),
            CborValue::Tagged(tagged) => tagged.hash(state),
        }
    }
}

impl CborValue {
    pub fn tagged(tag: u64, value: CborValue) -> Self {
        CborValue::Tagged(Box::new(Tagged::new(tag, value)))
    }

    /// Short human-readable kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CborValue::Null => "null",
            CborValue::Undefined => "undefined",
            CborValue::Bool(_) => "bool",
            CborValue::Integer(_) => "integer",
            CborValue::Float(_) => "float",
            CborValue::Text(_) => "text",
            CborValue::Bytes(_) => "bytes",
            CborValue::Array(_) => "array",
            CborValue::Tuple(_) => "tuple",
            CborValue::Map(_) => "map",
            CborValue::FrozenMap(_) => "frozen map",
            CborValue::Set(_) => "set",
            CborValue::FrozenSet(_) => "frozen set",
            CborValue::DateTime(_) => "datetime",
            CborValue::Uuid(_) => "uuid",
            CborValue::Fraction(_) => "fraction",
            CborValue::Decimal(_) => "decimal",
            CborValue::Regex(_) => "regex",
            CborValue::IpAddress(_) => "ip address",
            CborValue::IpNetwork(_) => "ip network",
            CborValue::Mime(_) => "mime message",
            CborValue::Simple(_) => "simple value",
            CborValue::Tagged(_) => "tagged value",
        }
    }

    /// Immutable equivalent, used for map keys and set members:
    /// arrays become tuples, sets frozen sets, maps frozen maps.
    pub fn freeze(self) -> CborValue {
        match self {
            CborValue::Array(items) | CborValue::Tuple(items) => {
                CborValue::Tuple(items.into_iter().map(CborValue::freeze).collect())
            }
            CborValue::Map(map) | CborValue::FrozenMap(map) => CborValue::FrozenMap(
                map.into_iter()
                    .map(|(k, v)| (k.freeze(), v.freeze()))
                    .collect(),
            ),
            CborValue::Set(set) | CborValue::FrozenSet(set) => {
                CborValue::FrozenSet(set.into_iter().map(CborValue::freeze).collect())
            }
            CborValue::Tagged(t) => {
                let Tagged { tag, value } = *t;
                CborValue::tagged(tag, value.freeze())
            }
            other => other,
        }
    }
}

/// Splits an integer outside the 64-bit CBOR range into its bignum tag and
/// big-endian magnitude bytes. Returns `None` for integers that fit a head.
pub fn bignum_parts(int: i128) -> Option<(u64, Vec<u8>)> {
    let (tag, magnitude) = if int > u64::MAX as i128 {
        (TAG_POS_BIGNUM, int as u128)
    } else if int < -(u64::MAX as i128) - 1 {
        (TAG_NEG_BIGNUM, (-1 - int) as u128)
    } else {
        return None;
    };
    let bytes = magnitude.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    Some((tag, bytes[skip..].to_vec()))
}

/// Inverse of [`bignum_parts`]; `None` when the tag is not a bignum tag or
/// the magnitude does not fit `i128`.
pub fn integer_from_bignum(tag: u64, bytes: &[u8]) -> Option<i128> {
    if tag != TAG_POS_BIGNUM && tag != TAG_NEG_BIGNUM {
        return None;
    }
    let significant = &bytes[bytes.iter().take_while(|b| **b == 0).count()..];
    if significant.len() > 16 {
        return None;
    }
    let mut buf = [0u8; 16];
    buf[16 - significant.len()..].copy_from_slice(significant);
    let magnitude = i128::try_from(u128::from_be_bytes(buf)).ok()?;
    if tag == TAG_POS_BIGNUM {
        Some(magnitude)
    } else {
        Some(-1 - magnitude)
    }
}

/// An integer of any size: `Integer` when it fits `i128`, otherwise the
/// bignum tag over its magnitude bytes.
pub fn integer_value(int: &BigInt) -> CborValue {
    if let Some(small) = int.to_i128() {
        return CborValue::Integer(small);
    }
    let (tag, magnitude): (u64, BigUint) = if int.sign() == Sign::Minus {
        (TAG_NEG_BIGNUM, (-int - BigInt::one()).magnitude().clone())
    } else {
        (TAG_POS_BIGNUM, int.magnitude().clone())
    };
    CborValue::tagged(tag, CborValue::Bytes(magnitude.to_bytes_be()))
}

/// Reads a plain `Integer` or a bignum-tagged byte string as an integer.
pub fn big_integer(value: &CborValue) -> Option<BigInt> {
    match value {
        CborValue::Integer(int) => Some(BigInt::from(*int)),
        CborValue::Tagged(tagged) => {
            let CborValue::Bytes(bytes) = &tagged.value else {
                return None;
            };
            let magnitude = BigInt::from_bytes_be(Sign::Plus, bytes);
            match tagged.tag {
                TAG_POS_BIGNUM => Some(magnitude),
                TAG_NEG_BIGNUM => Some(-(magnitude + BigInt::one())),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_is_deep() {
        let mut inner = Map::new();
        inner.insert(CborValue::Text("k".into()), CborValue::Array(vec![]));
        let value = CborValue::Array(vec![CborValue::Map(inner), CborValue::Integer(1)]);
        let mut expected_inner = Map::new();
        expected_inner.insert(CborValue::Text("k".into()), CborValue::Tuple(vec![]));
        assert_eq!(
            value.freeze(),
            CborValue::Tuple(vec![
                CborValue::FrozenMap(expected_inner),
                CborValue::Integer(1)
            ])
        );
    }

    #[test]
    fn bignum_boundaries() {
        assert_eq!(bignum_parts(u64::MAX as i128), None);
        assert_eq!(bignum_parts(-(u64::MAX as i128) - 1), None);
        assert_eq!(
            bignum_parts(u64::MAX as i128 + 1),
            Some((2, vec![1, 0, 0, 0, 0, 0, 0, 0, 0]))
        );
        assert_eq!(
            bignum_parts(-(u64::MAX as i128) - 2),
            Some((3, vec![1, 0, 0, 0, 0, 0, 0, 0, 0]))
        );
        for int in [i128::MAX, i128::MIN, 1 << 100, -(1 << 90)] {
            let (tag, bytes) = bignum_parts(int).unwrap();
            assert_eq!(integer_from_bignum(tag, &bytes), Some(int));
        }
        assert_eq!(integer_from_bignum(2, &[1; 17]), None);
        assert_eq!(integer_from_bignum(2, &[0xff; 16]), None);
        assert_eq!(integer_from_bignum(3, &[0, 0, 5]), Some(-6));
    }

    #[test]
    fn integers_beyond_i128_use_bignum_tags() {
        let huge: BigInt = "-1000000000000000000000000000000000000000000".parse().unwrap();
        let value = integer_value(&huge);
        let CborValue::Tagged(tagged) = &value else {
            panic!("expected a bignum tag, got {value:?}");
        };
        assert_eq!(tagged.tag, TAG_NEG_BIGNUM);
        assert_eq!(big_integer(&value), Some(huge));
        assert_eq!(integer_value(&BigInt::from(-7)), CborValue::Integer(-7));
        assert_eq!(big_integer(&CborValue::Integer(-7)), Some(BigInt::from(-7)));
        assert_eq!(big_integer(&CborValue::Text("7".into())), None);
    }

    #[test]
    fn equal_values_hash_alike() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |value: &CborValue| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&CborValue::Float(0.0)), hash(&CborValue::Float(-0.0)));
        let one = (CborValue::Integer(1), CborValue::Null);
        let b = (CborValue::Text("b".into()), CborValue::Bool(true));
        let a: Map<CborValue> = [one.clone(), b.clone()].into_iter().collect();
        let b: Map<CborValue> = [b, one].into_iter().collect();
        assert_eq!(hash(&CborValue::FrozenMap(a)), hash(&CborValue::FrozenMap(b)));
        assert_ne!(CborValue::Integer(1), CborValue::Float(1.0));
    }
}
