//! `CborEncoder` writes the intermediate model as canonical CBOR.
//!
//! Heads use the shortest argument width, floats the narrowest lossless
//! width, and map entries and set members are ordered by their encoded key
//! (shorter first, then bytewise), so equal values always produce equal bytes.

use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use half::f16;

use super::constants::*;
use crate::collections::{Map, Set};
use crate::decimal::Decimal;
use crate::intermediate::{bignum_parts, integer_value, CborValue};

/// Encodes one value into a fresh buffer.
pub fn encode(value: &CborValue) -> Vec<u8> {
    CborEncoder::new().encode(value)
}

#[derive(Debug, Default)]
pub struct CborEncoder {
    buf: Vec<u8>,
}

impl CborEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, value: &CborValue) -> Vec<u8> {
        self.buf.clear();
        self.write_any(value);
        std::mem::take(&mut self.buf)
    }

    pub fn write_any(&mut self, value: &CborValue) {
        match value {
            CborValue::Null => self.buf.push(NULL),
            CborValue::Undefined => self.buf.push(UNDEFINED),
            CborValue::Bool(b) => self.buf.push(if *b { TRUE } else { FALSE }),
            CborValue::Integer(int) => self.write_integer(*int),
            CborValue::Float(float) => self.write_float(*float),
            CborValue::Text(s) => self.write_str(s),
            CborValue::Bytes(b) => self.write_bin(b),
            CborValue::Array(items) | CborValue::Tuple(items) => self.write_arr(items),
            CborValue::Map(map) | CborValue::FrozenMap(map) => self.write_map(map),
            CborValue::Set(set) | CborValue::FrozenSet(set) => self.write_set(set),
            CborValue::DateTime(dt) => self.write_datetime(dt),
            CborValue::Uuid(uuid) => {
                self.write_tag_hdr(TAG_UUID);
                self.write_bin(uuid.as_bytes());
            }
            CborValue::Fraction(fraction) => {
                self.write_tag_hdr(TAG_FRACTION);
                self.write_hdr(MAJOR_ARRAY, 2);
                self.write_any(&integer_value(fraction.numer()));
                self.write_any(&integer_value(fraction.denom()));
            }
            CborValue::Decimal(decimal) => self.write_decimal(decimal),
            CborValue::Regex(pattern) => {
                self.write_tag_hdr(TAG_REGEX);
                self.write_str(pattern.as_str());
            }
            CborValue::IpAddress(addr) => {
                self.write_tag_hdr(TAG_IP_ADDRESS);
                self.write_ip(addr);
            }
            CborValue::IpNetwork(network) => {
                self.write_tag_hdr(TAG_IP_NETWORK);
                self.write_hdr(MAJOR_MAP, 1);
                self.write_ip(&network.addr());
                self.write_hdr(MAJOR_UNSIGNED, network.prefix() as u64);
            }
            CborValue::Mime(message) => {
                self.write_tag_hdr(TAG_MIME);
                self.write_str(message.as_str());
            }
            CborValue::Simple(simple) => self.write_simple(simple.value()),
            CborValue::Tagged(tagged) => {
                self.write_tag_hdr(tagged.tag);
                self.write_any(&tagged.value);
            }
        }
    }

    /// Writes a head with the shortest argument encoding for `arg`.
    pub fn write_hdr(&mut self, major: u8, arg: u64) {
        let major = major << 5;
        if arg < INFO_U8 as u64 {
            self.buf.push(major | arg as u8);
        } else if arg <= 0xff {
            self.buf.push(major | INFO_U8);
            self.buf.push(arg as u8);
        } else if arg <= 0xffff {
            self.buf.push(major | INFO_U16);
            self.buf.extend_from_slice(&(arg as u16).to_be_bytes());
        } else if arg <= 0xffff_ffff {
            self.buf.push(major | INFO_U32);
            self.buf.extend_from_slice(&(arg as u32).to_be_bytes());
        } else {
            self.buf.push(major | INFO_U64);
            self.buf.extend_from_slice(&arg.to_be_bytes());
        }
    }

    pub fn write_tag_hdr(&mut self, tag: u64) {
        self.write_hdr(MAJOR_TAG, tag);
    }

    /// Integers beyond the 64-bit head range become bignums (tags 2/3).
    pub fn write_integer(&mut self, int: i128) {
        if let Some((tag, magnitude)) = bignum_parts(int) {
            self.write_tag_hdr(tag);
            self.write_bin(&magnitude);
        } else if int >= 0 {
            self.write_hdr(MAJOR_UNSIGNED, int as u64);
        } else {
            self.write_hdr(MAJOR_NEGATIVE, (-1 - int) as u64);
        }
    }

    /// Tag 4 `[exponent, mantissa]`. CBOR has no decimal infinities or NaNs,
    /// so those are written as floats and `-0` loses its sign.
    pub fn write_decimal(&mut self, decimal: &Decimal) {
        if let (Some(exponent), Some(mantissa)) = (decimal.exponent(), decimal.mantissa()) {
            self.write_tag_hdr(TAG_DECIMAL);
            self.write_hdr(MAJOR_ARRAY, 2);
            self.write_integer(exponent as i128);
            self.write_any(&integer_value(&mantissa));
        } else if decimal.is_nan() {
            self.write_float(f64::NAN);
        } else if decimal.is_negative() {
            self.write_float(f64::NEG_INFINITY);
        } else {
            self.write_float(f64::INFINITY);
        }
    }

    /// Narrowest of f16/f32/f64 that reproduces `float` exactly.
    pub fn write_float(&mut self, float: f64) {
        if float.is_nan() {
            self.buf.push(FLOAT16);
            self.buf.extend_from_slice(&f16::NAN.to_bits().to_be_bytes());
            return;
        }
        let half = f16::from_f64(float);
        if half.to_f64() == float {
            self.buf.push(FLOAT16);
            self.buf.extend_from_slice(&half.to_bits().to_be_bytes());
        } else if (float as f32) as f64 == float {
            self.buf.push(FLOAT32);
            self.buf.extend_from_slice(&(float as f32).to_be_bytes());
        } else {
            self.buf.push(FLOAT64);
            self.buf.extend_from_slice(&float.to_be_bytes());
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_hdr(MAJOR_TEXT, s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_bin(&mut self, bytes: &[u8]) {
        self.write_hdr(MAJOR_BYTES, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_simple(&mut self, value: u8) {
        if value < INFO_U8 {
            self.buf.push((MAJOR_SIMPLE << 5) | value);
        } else {
            self.buf.push(SIMPLE_U8);
            self.buf.push(value);
        }
    }

    pub fn write_arr(&mut self, items: &[CborValue]) {
        self.write_hdr(MAJOR_ARRAY, items.len() as u64);
        for item in items {
            self.write_any(item);
        }
    }

    pub fn write_map(&mut self, map: &Map<CborValue>) {
        let mut entries: Vec<(Vec<u8>, &CborValue)> =
            map.iter().map(|(k, v)| (encode(k), v)).collect();
        entries.sort_by(|(a, _), (b, _)| canonical_order(a, b));
        self.write_hdr(MAJOR_MAP, entries.len() as u64);
        for (key, value) in entries {
            self.buf.extend_from_slice(&key);
            self.write_any(value);
        }
    }

    pub fn write_set(&mut self, set: &Set<CborValue>) {
        let mut members: Vec<Vec<u8>> = set.iter().map(encode).collect();
        members.sort_by(|a, b| canonical_order(a, b));
        self.write_tag_hdr(TAG_SET);
        self.write_hdr(MAJOR_ARRAY, members.len() as u64);
        for member in members {
            self.buf.extend_from_slice(&member);
        }
    }

    /// Tag 1 with integer seconds, or float seconds when there is a
    /// sub-second part.
    pub fn write_datetime(&mut self, dt: &DateTime<FixedOffset>) {
        self.write_tag_hdr(TAG_EPOCH_DATETIME);
        let secs = dt.timestamp();
        let nanos = dt.timestamp_subsec_nanos();
        if nanos == 0 {
            self.write_integer(secs as i128);
        } else {
            self.write_float(secs as f64 + nanos as f64 / 1e9);
        }
    }

    fn write_ip(&mut self, addr: &IpAddr) {
        match addr {
            IpAddr::V4(v4) => self.write_bin(&v4.octets()),
            IpAddr::V6(v6) => self.write_bin(&v6.octets()),
        }
    }
}

fn canonical_order(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
