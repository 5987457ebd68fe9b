//! Intermediate ⇄ jsonable mapping.
//!
//! Anything plain JSON cannot carry is written as a wrapper object whose
//! first key is `"$type"`. A real object that happens to contain a
//! `"$type"` key is escaped as a `map` wrapper, so on the way back every
//! object with `"$type"` is a wrapper.

use std::fmt;
use std::net::IpAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cbor_json_base58::{from_base58, to_base58};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::{Map as JsonMap, Number, Value};
use uuid::Uuid;

use super::native::{date_from_days, epoch};
use super::{ConversionOptions, Depth};
use crate::collections::{Map, Set};
use crate::custom;
use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::fraction::Fraction;
use crate::intermediate::{
    integer_from_bignum, CborValue, Tagged, TAG_CUSTOM_OBJECT, TAG_DATE, TAG_NEG_BIGNUM,
    TAG_POS_BIGNUM,
};
use crate::values::{IpNetwork, MimeMessage, Pattern, SimpleValue};

pub const TYPE_KEY: &str = "$type";
pub const VALUE_KEY: &str = "$value";
pub const CBOR_TAG_KEY: &str = "$cbor_tag";
pub const CLASS_KEY: &str = "$class";
pub const CLASS_TAG_KEY: &str = "$class_tag";

/// Largest byte string written as hex.
pub const HEX_MAX_LEN: usize = 16;
/// Largest byte string written as base58; longer ones use base64.
pub const BASE58_MAX_LEN: usize = 32;

/// Converts an intermediate tree to a JSON-safe [`Value`].
pub fn intermediate_to_jsonable(value: &CborValue, options: &ConversionOptions) -> Result<Value> {
    JsonableEncoder {
        depth: Depth::new(options),
    }
    .encode(value)
}

/// Converts a JSON value, unescaping `$type` wrappers, to the intermediate model.
pub fn jsonable_to_intermediate(value: &Value, options: &ConversionOptions) -> Result<CborValue> {
    JsonableDecoder {
        depth: Depth::new(options),
    }
    .decode(value)
}

fn wrapper(type_tag: &str) -> JsonMap<String, Value> {
    let mut obj = JsonMap::new();
    obj.insert(TYPE_KEY.to_owned(), Value::String(type_tag.to_owned()));
    obj
}

fn wrap(type_tag: &str, value: Value) -> Value {
    let mut obj = wrapper(type_tag);
    obj.insert(VALUE_KEY.to_owned(), value);
    Value::Object(obj)
}

fn binary(bytes: &[u8]) -> Value {
    if bytes.len() <= HEX_MAX_LEN {
        wrap("binary-hex", Value::String(hex::encode(bytes)))
    } else if bytes.len() <= BASE58_MAX_LEN {
        wrap("binary-base58", Value::String(to_base58(bytes)))
    } else {
        wrap("binary-base64", Value::String(STANDARD.encode(bytes)))
    }
}

fn tagged_value(tag: u64, value: Value) -> Value {
    let mut obj = wrapper("tagged-value");
    obj.insert(CBOR_TAG_KEY.to_owned(), Value::from(tag));
    obj.insert(VALUE_KEY.to_owned(), value);
    Value::Object(obj)
}

struct JsonableEncoder {
    depth: Depth,
}

impl JsonableEncoder {
    fn encode(&mut self, value: &CborValue) -> Result<Value> {
        Ok(match value {
            CborValue::Null => Value::Null,
            CborValue::Bool(b) => Value::Bool(*b),
            CborValue::Text(s) => Value::String(s.clone()),
            CborValue::Integer(int) => encode_integer(*int),
            CborValue::Float(float) => Number::from_f64(*float)
                .map(Value::Number)
                .ok_or_else(|| Error::NotJsonSafe {
                    type_name: format!("float {float}"),
                })?,
            CborValue::Bytes(bytes) => binary(bytes),
            CborValue::Array(items) | CborValue::Tuple(items) => {
                Value::Array(self.nested(|this| this.encode_seq(items))?)
            }
            CborValue::Map(map) | CborValue::FrozenMap(map) => {
                self.nested(|this| this.encode_map(map))?
            }
            CborValue::Set(set) | CborValue::FrozenSet(set) => {
                let members = self.nested(|this| set.iter().map(|m| this.encode(m)).collect())?;
                wrap("set", Value::Array(members))
            }
            CborValue::DateTime(dt) => wrap(
                "datetime",
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            ),
            CborValue::Undefined => Value::Object(wrapper("undefined")),
            CborValue::Uuid(uuid) => wrap("uuid", Value::String(uuid.hyphenated().to_string())),
            CborValue::Fraction(fraction) => wrap("fraction", Value::String(fraction.to_string())),
            CborValue::Decimal(decimal) => wrap("decimal", Value::String(decimal.to_string())),
            CborValue::Simple(simple) => wrap("cbor-simple-value", Value::from(simple.value())),
            CborValue::Regex(pattern) => wrap("regex", Value::String(pattern.as_str().to_owned())),
            CborValue::IpAddress(addr) => wrap("ipaddress", Value::String(addr.to_string())),
            CborValue::IpNetwork(network) => wrap("ipnetwork", Value::String(network.to_string())),
            CborValue::Mime(message) => wrap(
                "mime",
                Value::String(STANDARD.encode(message.as_str().as_bytes())),
            ),
            CborValue::Tagged(tagged) => self.nested(|this| this.encode_tagged(tagged))?,
        })
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth.enter()?;
        let out = f(self);
        self.depth.leave();
        out
    }

    fn encode_seq(&mut self, items: &[CborValue]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.encode(item)).collect()
    }

    fn encode_map(&mut self, map: &Map<CborValue>) -> Result<Value> {
        let plain = map
            .keys()
            .all(|key| matches!(key, CborValue::Text(k) if k != TYPE_KEY));
        if plain {
            let mut obj = JsonMap::new();
            for (key, value) in map.iter() {
                if let CborValue::Text(key) = key {
                    obj.insert(key.clone(), self.encode(value)?);
                }
            }
            return Ok(Value::Object(obj));
        }
        let mut pairs = Vec::with_capacity(map.len());
        for (key, value) in map.iter() {
            pairs.push(Value::Array(vec![self.encode(key)?, self.encode(value)?]));
        }
        Ok(wrap("map", Value::Array(pairs)))
    }

    fn encode_tagged(&mut self, tagged: &Tagged<CborValue>) -> Result<Value> {
        match (tagged.tag, &tagged.value) {
            (TAG_CUSTOM_OBJECT, CborValue::Array(items) | CborValue::Tuple(items)) => {
                if let Some((CborValue::Text(class_tag), values)) = items.split_first() {
                    let mut obj = wrapper("custom-object");
                    obj.insert(
                        CLASS_KEY.to_owned(),
                        Value::String(custom::describe(class_tag)),
                    );
                    obj.insert(CLASS_TAG_KEY.to_owned(), Value::String(class_tag.clone()));
                    obj.insert(VALUE_KEY.to_owned(), Value::Array(self.encode_seq(values)?));
                    return Ok(Value::Object(obj));
                }
            }
            (TAG_DATE, CborValue::Integer(days)) => {
                if let Ok(date) = date_from_days(*days) {
                    return Ok(wrap(
                        "date",
                        Value::String(date.format("%Y-%m-%d").to_string()),
                    ));
                }
            }
            _ => {}
        }
        Ok(tagged_value(tagged.tag, self.encode(&tagged.value)?))
    }
}

/// Integers outside both i64 and u64 travel in CBOR bignum form.
fn encode_integer(int: i128) -> Value {
    if let Ok(int) = i64::try_from(int) {
        return Value::from(int);
    }
    if let Ok(uint) = u64::try_from(int) {
        return Value::from(uint);
    }
    let (tag, magnitude) = if int < 0 {
        (TAG_NEG_BIGNUM, (-1 - int) as u128)
    } else {
        (TAG_POS_BIGNUM, int as u128)
    };
    let bytes = magnitude.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    tagged_value(tag, binary(&bytes[skip..]))
}

struct JsonableDecoder {
    depth: Depth,
}

impl JsonableDecoder {
    fn decode(&mut self, value: &Value) -> Result<CborValue> {
        Ok(match value {
            Value::Null => CborValue::Null,
            Value::Bool(b) => CborValue::Bool(*b),
            Value::Number(n) => decode_number(n),
            Value::String(s) => CborValue::Text(s.clone()),
            Value::Array(items) => CborValue::Array(self.nested(|this| this.decode_seq(items))?),
            Value::Object(obj) => match obj.get(TYPE_KEY) {
                None => CborValue::Map(self.nested(|this| this.decode_object(obj))?),
                Some(Value::String(type_tag)) => {
                    self.nested(|this| this.decode_wrapper(type_tag, obj))?
                }
                Some(other) => {
                    return Err(Error::UnsupportedTag {
                        type_tag: other.to_string(),
                    })
                }
            },
        })
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth.enter()?;
        let out = f(self);
        self.depth.leave();
        out
    }

    fn decode_seq(&mut self, items: &[Value]) -> Result<Vec<CborValue>> {
        items.iter().map(|item| self.decode(item)).collect()
    }

    fn decode_object(&mut self, obj: &JsonMap<String, Value>) -> Result<Map<CborValue>> {
        let mut map = Map::with_capacity(obj.len());
        for (key, value) in obj {
            map.insert(CborValue::Text(key.clone()), self.decode(value)?);
        }
        Ok(map)
    }

    fn decode_wrapper(&mut self, type_tag: &str, obj: &JsonMap<String, Value>) -> Result<CborValue> {
        let w = Wrapper { type_tag, obj };
        Ok(match type_tag {
            "map" => {
                let mut map = Map::new();
                for pair in w.array(VALUE_KEY)? {
                    let [key, value] = pair.as_array().map(Vec::as_slice).unwrap_or_default() else {
                        return Err(w.bad("entries must be [key, value] pairs"));
                    };
                    let key = self.decode(key)?.freeze();
                    map.insert(key, self.decode(value)?);
                }
                CborValue::Map(map)
            }
            "set" => {
                let mut set = Set::new();
                for member in w.array(VALUE_KEY)? {
                    set.insert(self.decode(member)?.freeze());
                }
                CborValue::Set(set)
            }
            "datetime" => {
                let s = w.text(VALUE_KEY)?;
                let dt = parse_datetime(s)
                    .ok_or_else(|| w.bad(format!("{s:?} is not an ISO 8601 datetime")))?;
                CborValue::DateTime(dt)
            }
            "binary-hex" => {
                CborValue::Bytes(hex::decode(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?)
            }
            "binary-base58" => CborValue::Bytes(
                from_base58(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?,
            ),
            "binary-base64" => {
                CborValue::Bytes(decode_base64(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?)
            }
            "custom-object" => {
                let class_tag = w.text(CLASS_TAG_KEY)?;
                let values = w.array(VALUE_KEY)?;
                let mut items = Vec::with_capacity(values.len() + 1);
                items.push(CborValue::Text(class_tag.to_owned()));
                for value in values {
                    items.push(self.decode(value)?);
                }
                CborValue::tagged(TAG_CUSTOM_OBJECT, CborValue::Array(items))
            }
            "date" => {
                let s = w.text(VALUE_KEY)?;
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| w.bad(format!("{s:?}: {e}")))?;
                let days = date.signed_duration_since(epoch()).num_days();
                CborValue::tagged(TAG_DATE, CborValue::Integer(days as i128))
            }
            "tagged-value" => {
                let tag = w
                    .field(CBOR_TAG_KEY)?
                    .as_u64()
                    .ok_or_else(|| w.bad("\"$cbor_tag\" must be an unsigned integer"))?;
                let value = self.decode(w.field(VALUE_KEY)?)?;
                let bignum = match &value {
                    CborValue::Bytes(bytes) => integer_from_bignum(tag, bytes),
                    _ => None,
                };
                match bignum {
                    Some(int) => CborValue::Integer(int),
                    None => CborValue::tagged(tag, value),
                }
            }
            "undefined" => CborValue::Undefined,
            "uuid" => CborValue::Uuid(
                Uuid::parse_str(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?,
            ),
            "fraction" => {
                CborValue::Fraction(w.text(VALUE_KEY)?.parse::<Fraction>().map_err(|e| w.bad(e))?)
            }
            "decimal" => {
                CborValue::Decimal(w.text(VALUE_KEY)?.parse::<Decimal>().map_err(|e| w.bad(e))?)
            }
            "cbor-simple-value" => {
                let simple = w
                    .field(VALUE_KEY)?
                    .as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .and_then(SimpleValue::new)
                    .ok_or_else(|| w.bad("not a valid simple value"))?;
                CborValue::Simple(simple)
            }
            "regex" => CborValue::Regex(
                Pattern::new(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?,
            ),
            "ipaddress" => CborValue::IpAddress(
                w.text(VALUE_KEY)?
                    .parse::<IpAddr>()
                    .map_err(|e| w.bad(e))?,
            ),
            "ipnetwork" => CborValue::IpNetwork(
                w.text(VALUE_KEY)?
                    .parse::<IpNetwork>()
                    .map_err(|e| w.bad(e))?,
            ),
            "mime" => {
                let raw = decode_base64(w.text(VALUE_KEY)?).map_err(|e| w.bad(e))?;
                let raw = String::from_utf8(raw).map_err(|_| w.bad("payload is not UTF-8"))?;
                CborValue::Mime(MimeMessage::new(raw))
            }
            _ => {
                return Err(Error::UnsupportedTag {
                    type_tag: type_tag.to_owned(),
                })
            }
        })
    }
}

/// Field access on a `$type` wrapper, reporting problems against its type name.
struct Wrapper<'a> {
    type_tag: &'a str,
    obj: &'a JsonMap<String, Value>,
}

impl<'a> Wrapper<'a> {
    fn bad(&self, reason: impl fmt::Display) -> Error {
        Error::malformed(self.type_tag, reason)
    }

    fn field(&self, key: &str) -> Result<&'a Value> {
        self.obj
            .get(key)
            .ok_or_else(|| self.bad(format!("missing \"{key}\"")))
    }

    fn text(&self, key: &str) -> Result<&'a str> {
        self.field(key)?
            .as_str()
            .ok_or_else(|| self.bad(format!("\"{key}\" must be a string")))
    }

    fn array(&self, key: &str) -> Result<&'a Vec<Value>> {
        self.field(key)?
            .as_array()
            .ok_or_else(|| self.bad(format!("\"{key}\" must be an array")))
    }
}

fn decode_number(n: &Number) -> CborValue {
    if let Some(int) = n.as_i64() {
        CborValue::Integer(int as i128)
    } else if let Some(uint) = n.as_u64() {
        CborValue::Integer(uint as i128)
    } else {
        CborValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn decode_base64(s: &str) -> std::result::Result<Vec<u8>, String> {
    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| e.to_string())
}

/// RFC 3339, or an ISO 8601 datetime without offset read as UTC.
fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}
