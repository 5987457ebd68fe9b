//! Native ⇄ intermediate mapping.
//!
//! Dates and custom objects are the only kinds whose shape changes; they
//! travel under the reserved tags 100 and 27. Everything else maps onto the
//! same-named variant.

use std::collections::HashSet;
use std::rc::Rc;

use chrono::NaiveDate;

use super::{ConversionOptions, Depth};
use crate::collections::{Map, Set};
use crate::custom::{self, UnrecognizedObject};
use crate::error::{Direction, Error, Result};
use crate::intermediate::{CborValue, Tagged, TAG_CUSTOM_OBJECT, TAG_DATE};
use crate::native::NativeValue;

pub(crate) fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Converts a native tree to the intermediate model.
///
/// Fails with [`Error::CyclicStructure`] if a shared container contains
/// itself. A container referenced from several places is simply copied.
pub fn native_to_intermediate(
    value: &NativeValue,
    options: &ConversionOptions,
) -> Result<CborValue> {
    NativeEncoder::new(options).encode(value)
}

/// Converts an intermediate tree to native values, rebuilding registered
/// custom objects.
pub fn intermediate_to_native(
    value: CborValue,
    options: &ConversionOptions,
) -> Result<NativeValue> {
    NativeDecoder {
        depth: Depth::new(options),
    }
    .decode(value)
}

struct NativeEncoder {
    depth: Depth,
    in_progress: HashSet<usize>,
}

impl NativeEncoder {
    fn new(options: &ConversionOptions) -> Self {
        Self {
            depth: Depth::new(options),
            in_progress: HashSet::new(),
        }
    }

    fn encode(&mut self, value: &NativeValue) -> Result<CborValue> {
        Ok(match value {
            NativeValue::Null => CborValue::Null,
            NativeValue::Undefined => CborValue::Undefined,
            NativeValue::Bool(b) => CborValue::Bool(*b),
            NativeValue::Integer(i) => CborValue::Integer(*i),
            NativeValue::Float(f) => CborValue::Float(*f),
            NativeValue::Text(s) => CborValue::Text(s.clone()),
            NativeValue::Bytes(b) => CborValue::Bytes(b.clone()),
            NativeValue::DateTime(dt) => CborValue::DateTime(*dt),
            NativeValue::Uuid(u) => CborValue::Uuid(*u),
            NativeValue::Fraction(f) => CborValue::Fraction(f.clone()),
            NativeValue::Decimal(d) => CborValue::Decimal(d.clone()),
            NativeValue::Regex(p) => CborValue::Regex(p.clone()),
            NativeValue::IpAddress(a) => CborValue::IpAddress(*a),
            NativeValue::IpNetwork(n) => CborValue::IpNetwork(*n),
            NativeValue::Mime(m) => CborValue::Mime(m.clone()),
            NativeValue::Simple(s) => CborValue::Simple(*s),
            NativeValue::Date(date) => CborValue::tagged(
                TAG_DATE,
                CborValue::Integer(date.signed_duration_since(epoch()).num_days() as i128),
            ),
            NativeValue::List(items) => self.with_identity(identity(items), |this| {
                Ok(CborValue::Array(this.encode_seq(&items.borrow())?))
            })?,
            NativeValue::Tuple(items) => {
                self.nested(|this| Ok(CborValue::Tuple(this.encode_seq(items)?)))?
            }
            NativeValue::Map(map) => self.with_identity(identity(map), |this| {
                Ok(CborValue::Map(this.encode_map(&map.borrow())?))
            })?,
            NativeValue::FrozenMap(map) => {
                self.nested(|this| Ok(CborValue::FrozenMap(this.encode_map(map)?)))?
            }
            NativeValue::Set(set) => self.with_identity(identity(set), |this| {
                Ok(CborValue::Set(this.encode_set(&set.borrow())?))
            })?,
            NativeValue::FrozenSet(set) => {
                self.nested(|this| Ok(CborValue::FrozenSet(this.encode_set(set)?)))?
            }
            NativeValue::Tagged(tagged) => self.nested(|this| {
                Ok(CborValue::tagged(tagged.tag, this.encode(&tagged.value)?))
            })?,
            NativeValue::Object(object) => self.with_identity(identity(object), |this| {
                let (class_tag, values) = {
                    let object = object.borrow();
                    (object.class_tag().to_owned(), object.values())
                };
                this.encode_object(&class_tag, &values)
            })?,
            NativeValue::Unrecognized(UnrecognizedObject { class_tag, values }) => {
                self.nested(|this| this.encode_object(class_tag, values))?
            }
        })
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth.enter()?;
        let out = f(self);
        self.depth.leave();
        out
    }

    /// Runs `f` with `id` marked as being converted.
    fn with_identity<T>(
        &mut self,
        id: usize,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if !self.in_progress.insert(id) {
            return Err(Error::CyclicStructure);
        }
        let out = self.nested(f);
        self.in_progress.remove(&id);
        out
    }

    fn encode_seq(&mut self, items: &[NativeValue]) -> Result<Vec<CborValue>> {
        items.iter().map(|item| self.encode(item)).collect()
    }

    fn encode_map(&mut self, map: &Map<NativeValue>) -> Result<Map<CborValue>> {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map.iter() {
            let key = self.encode(key)?.freeze();
            out.insert(key, self.encode(value)?);
        }
        Ok(out)
    }

    fn encode_set(&mut self, set: &Set<NativeValue>) -> Result<Set<CborValue>> {
        let mut out = Set::new();
        for member in set {
            out.insert(self.encode(member)?.freeze());
        }
        Ok(out)
    }

    fn encode_object(&mut self, class_tag: &str, values: &[NativeValue]) -> Result<CborValue> {
        if class_tag.is_empty() {
            return Err(Error::UnsupportedType {
                direction: Direction::Encoding,
                type_name: "custom object without a class tag".to_owned(),
            });
        }
        let mut items = Vec::with_capacity(values.len() + 1);
        items.push(CborValue::Text(class_tag.to_owned()));
        for value in values {
            items.push(self.encode(value)?);
        }
        Ok(CborValue::tagged(TAG_CUSTOM_OBJECT, CborValue::Array(items)))
    }
}

fn identity<T: ?Sized>(shared: &Rc<T>) -> usize {
    Rc::as_ptr(shared) as *const () as usize
}

struct NativeDecoder {
    depth: Depth,
}

impl NativeDecoder {
    fn decode(&mut self, value: CborValue) -> Result<NativeValue> {
        Ok(match value {
            CborValue::Null => NativeValue::Null,
            CborValue::Undefined => NativeValue::Undefined,
            CborValue::Bool(b) => NativeValue::Bool(b),
            CborValue::Integer(i) => NativeValue::Integer(i),
            CborValue::Float(f) => NativeValue::Float(f),
            CborValue::Text(s) => NativeValue::Text(s),
            CborValue::Bytes(b) => NativeValue::Bytes(b),
            CborValue::DateTime(dt) => NativeValue::DateTime(dt),
            CborValue::Uuid(u) => NativeValue::Uuid(u),
            CborValue::Fraction(f) => NativeValue::Fraction(f),
            CborValue::Decimal(d) => NativeValue::Decimal(d),
            CborValue::Regex(p) => NativeValue::Regex(p),
            CborValue::IpAddress(a) => NativeValue::IpAddress(a),
            CborValue::IpNetwork(n) => NativeValue::IpNetwork(n),
            CborValue::Mime(m) => NativeValue::Mime(m.normalized()),
            CborValue::Simple(s) => NativeValue::Simple(s),
            CborValue::Array(items) => {
                NativeValue::list(self.nested(|this| this.decode_seq(items))?)
            }
            CborValue::Tuple(items) => {
                NativeValue::Tuple(self.nested(|this| this.decode_seq(items))?)
            }
            CborValue::Map(map) => NativeValue::map(self.nested(|this| this.decode_map(map))?),
            CborValue::FrozenMap(map) => {
                NativeValue::FrozenMap(self.nested(|this| this.decode_map(map))?)
            }
            CborValue::Set(set) => NativeValue::set(self.nested(|this| this.decode_set(set))?),
            CborValue::FrozenSet(set) => {
                NativeValue::FrozenSet(self.nested(|this| this.decode_set(set))?)
            }
            CborValue::Tagged(tagged) => {
                let Tagged { tag, value } = *tagged;
                self.nested(|this| this.decode_tagged(tag, value))?
            }
        })
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth.enter()?;
        let out = f(self);
        self.depth.leave();
        out
    }

    fn decode_seq(&mut self, items: Vec<CborValue>) -> Result<Vec<NativeValue>> {
        items.into_iter().map(|item| self.decode(item)).collect()
    }

    fn decode_map(&mut self, map: Map<CborValue>) -> Result<Map<NativeValue>> {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            let key = self.decode(key)?;
            out.insert(key, self.decode(value)?);
        }
        Ok(out)
    }

    fn decode_set(&mut self, set: Set<CborValue>) -> Result<Set<NativeValue>> {
        let mut out = Set::new();
        for member in set {
            out.insert(self.decode(member)?);
        }
        Ok(out)
    }

    fn decode_tagged(&mut self, tag: u64, value: CborValue) -> Result<NativeValue> {
        match tag {
            TAG_DATE => match value {
                CborValue::Integer(days) => date_from_days(days).map(NativeValue::Date),
                other => Err(reserved_tag_payload(TAG_DATE, &other)),
            },
            TAG_CUSTOM_OBJECT => match value {
                CborValue::Array(items) | CborValue::Tuple(items) => self.decode_object(items),
                other => Err(reserved_tag_payload(TAG_CUSTOM_OBJECT, &other)),
            },
            _ => Ok(NativeValue::tagged(tag, self.decode(value)?)),
        }
    }

    fn decode_object(&mut self, items: Vec<CborValue>) -> Result<NativeValue> {
        let mut items = items.into_iter();
        let class_tag = match items.next() {
            Some(CborValue::Text(class_tag)) if !class_tag.is_empty() => class_tag,
            _ => {
                return Err(Error::UnsupportedType {
                    direction: Direction::Decoding,
                    type_name: format!("tag {TAG_CUSTOM_OBJECT} without a class tag"),
                })
            }
        };
        let values = self.decode_seq(items.collect())?;
        let Some(class) = custom::lookup(&class_tag) else {
            tracing::trace!(%class_tag, "decoding unrecognized custom object");
            return Ok(NativeValue::Unrecognized(UnrecognizedObject::new(
                class_tag, values,
            )));
        };
        let object = class.instantiate();
        object
            .borrow_mut()
            .set_values(values)
            .map_err(|source| Error::InvalidObjectValues {
                class_tag: class_tag.clone(),
                source,
            })?;
        Ok(NativeValue::Object(object))
    }
}

fn reserved_tag_payload(tag: u64, payload: &CborValue) -> Error {
    Error::UnsupportedType {
        direction: Direction::Decoding,
        type_name: format!("tag {tag} with a {} payload", payload.type_name()),
    }
}

pub(crate) fn date_from_days(days: i128) -> Result<NaiveDate> {
    i64::try_from(days)
        .ok()
        .and_then(|days| epoch().checked_add_signed(chrono::Duration::try_days(days)?))
        .ok_or_else(|| Error::UnsupportedType {
            direction: Direction::Decoding,
            type_name: format!("date {days} days from 1970-01-01"),
        })
}
