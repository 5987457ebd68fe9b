//! `CborDecoder` reads CBOR into the intermediate model.
//!
//! Both definite and indefinite lengths are accepted. Recognized semantic
//! tags become their dedicated variants; a tag whose payload does not have
//! the expected shape is kept as a plain `Tagged` value.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, FixedOffset};
use half::f16;
use uuid::Uuid;

use super::constants::*;
use super::error::CborError;
use crate::collections::Map;
use crate::decimal::Decimal;
use crate::fraction::Fraction;
use crate::intermediate::{
    big_integer, integer_from_bignum, CborValue, TAG_NEG_BIGNUM, TAG_POS_BIGNUM,
};
use crate::values::{IpNetwork, MimeMessage, Pattern, SimpleValue};

/// Decodes exactly one value from `bytes`.
pub fn decode(bytes: &[u8], max_depth: usize) -> Result<CborValue, CborError> {
    let mut decoder = CborDecoder::new(bytes, max_depth);
    let value = decoder.read_any()?;
    match bytes.len() - decoder.x {
        0 => Ok(value),
        rest => Err(CborError::TrailingBytes(rest)),
    }
}

pub struct CborDecoder<'a> {
    data: &'a [u8],
    pub x: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> CborDecoder<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            x: 0,
            depth: 0,
            max_depth,
        }
    }

    pub fn read_any(&mut self) -> Result<CborValue, CborError> {
        let byte = self.u8()?;
        self.read_item(byte)
    }

    fn read_item(&mut self, byte: u8) -> Result<CborValue, CborError> {
        let major = byte >> 5;
        let info = byte & 0x1f;
        match major {
            MAJOR_UNSIGNED => Ok(CborValue::Integer(self.read_arg(info)? as i128)),
            MAJOR_NEGATIVE => Ok(CborValue::Integer(-1 - self.read_arg(info)? as i128)),
            MAJOR_BYTES => Ok(CborValue::Bytes(self.read_bytes(MAJOR_BYTES, info)?)),
            MAJOR_TEXT => {
                let bytes = self.read_bytes(MAJOR_TEXT, info)?;
                String::from_utf8(bytes)
                    .map(CborValue::Text)
                    .map_err(|_| CborError::invalid("text string is not valid UTF-8"))
            }
            MAJOR_ARRAY => {
                self.enter()?;
                let items = self.read_arr(info)?;
                self.depth -= 1;
                Ok(CborValue::Array(items))
            }
            MAJOR_MAP => {
                self.enter()?;
                let map = self.read_map(info)?;
                self.depth -= 1;
                Ok(CborValue::Map(map))
            }
            MAJOR_TAG => {
                let tag = self.read_arg(info)?;
                self.enter()?;
                let value = self.read_any()?;
                self.depth -= 1;
                Ok(interpret_tag(tag, value))
            }
            _ => self.read_simple(byte, info),
        }
    }

    fn enter(&mut self) -> Result<(), CborError> {
        if self.depth >= self.max_depth {
            return Err(CborError::DepthLimit(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, CborError> {
        let byte = *self
            .data
            .get(self.x)
            .ok_or(CborError::UnexpectedEof(self.x))?;
        self.x += 1;
        Ok(byte)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        let end = self
            .x
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(CborError::UnexpectedEof(self.data.len()))?;
        let slice = &self.data[self.x..end];
        self.x = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CborError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_arg(&mut self, info: u8) -> Result<u64, CborError> {
        match info {
            0..=23 => Ok(info as u64),
            INFO_U8 => Ok(self.u8()? as u64),
            INFO_U16 => Ok(u16::from_be_bytes(self.take_array()?) as u64),
            INFO_U32 => Ok(u32::from_be_bytes(self.take_array()?) as u64),
            INFO_U64 => Ok(u64::from_be_bytes(self.take_array()?)),
            _ => Err(CborError::invalid(format!(
                "additional information {info} is not a valid argument"
            ))),
        }
    }

    fn read_len(&mut self, info: u8) -> Result<usize, CborError> {
        let len = self.read_arg(info)?;
        usize::try_from(len).map_err(|_| CborError::invalid("length does not fit in memory"))
    }

    fn at_break(&mut self) -> Result<bool, CborError> {
        if *self
            .data
            .get(self.x)
            .ok_or(CborError::UnexpectedEof(self.x))?
            == BREAK
        {
            self.x += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn read_bytes(&mut self, major: u8, info: u8) -> Result<Vec<u8>, CborError> {
        if info != INFO_INDEFINITE {
            let len = self.read_len(info)?;
            return Ok(self.take(len)?.to_vec());
        }
        let mut out = Vec::new();
        while !self.at_break()? {
            let byte = self.u8()?;
            if byte >> 5 != major || byte & 0x1f == INFO_INDEFINITE {
                return Err(CborError::invalid(
                    "indefinite-length string chunk has the wrong type",
                ));
            }
            let len = self.read_len(byte & 0x1f)?;
            out.extend_from_slice(self.take(len)?);
        }
        Ok(out)
    }

    fn read_arr(&mut self, info: u8) -> Result<Vec<CborValue>, CborError> {
        let mut items = Vec::new();
        if info == INFO_INDEFINITE {
            while !self.at_break()? {
                items.push(self.read_any()?);
            }
        } else {
            let len = self.read_len(info)?;
            // Each item takes at least one byte.
            items.reserve(len.min(self.data.len() - self.x));
            for _ in 0..len {
                items.push(self.read_any()?);
            }
        }
        Ok(items)
    }

    fn read_map(&mut self, info: u8) -> Result<Map<CborValue>, CborError> {
        let mut map = Map::new();
        if info == INFO_INDEFINITE {
            while !self.at_break()? {
                let key = self.read_any()?.freeze();
                map.insert(key, self.read_any()?);
            }
        } else {
            for _ in 0..self.read_len(info)? {
                let key = self.read_any()?.freeze();
                map.insert(key, self.read_any()?);
            }
        }
        Ok(map)
    }

    fn read_simple(&mut self, byte: u8, info: u8) -> Result<CborValue, CborError> {
        match byte {
            FALSE => Ok(CborValue::Bool(false)),
            TRUE => Ok(CborValue::Bool(true)),
            NULL => Ok(CborValue::Null),
            UNDEFINED => Ok(CborValue::Undefined),
            SIMPLE_U8 => {
                let value = self.u8()?;
                SimpleValue::new(value)
                    .filter(|_| value >= 32)
                    .map(CborValue::Simple)
                    .ok_or_else(|| {
                        CborError::invalid(format!("simple value {value} needs the short form"))
                    })
            }
            FLOAT16 => {
                let bits = u16::from_be_bytes(self.take_array()?);
                Ok(CborValue::Float(f16::from_bits(bits).to_f64()))
            }
            FLOAT32 => Ok(CborValue::Float(
                f32::from_be_bytes(self.take_array()?) as f64,
            )),
            FLOAT64 => Ok(CborValue::Float(f64::from_be_bytes(self.take_array()?))),
            BREAK => Err(CborError::invalid("unexpected break")),
            _ => SimpleValue::new(info)
                .map(CborValue::Simple)
                .ok_or_else(|| CborError::Unsupported(format!("initial byte 0x{byte:02x}"))),
        }
    }
}

/// Maps a tag and its decoded payload onto the dedicated variant, if any.
fn interpret_tag(tag: u64, value: CborValue) -> CborValue {
    match (tag, value) {
        (TAG_SELF_DESCRIBE, value) => value,
        (TAG_SET, CborValue::Array(items)) => {
            CborValue::Set(items.into_iter().map(CborValue::freeze).collect())
        }
        (tag, value) => recognize(tag, &value).unwrap_or_else(|| CborValue::tagged(tag, value)),
    }
}

fn recognize(tag: u64, value: &CborValue) -> Option<CborValue> {
    match (tag, value) {
        (TAG_DATETIME_STRING, CborValue::Text(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(CborValue::DateTime),
        (TAG_EPOCH_DATETIME, CborValue::Integer(secs)) => i64::try_from(*secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| CborValue::DateTime(dt.fixed_offset())),
        (TAG_EPOCH_DATETIME, CborValue::Float(secs)) => {
            epoch_float_datetime(*secs).map(CborValue::DateTime)
        }
        (TAG_POS_BIGNUM | TAG_NEG_BIGNUM, CborValue::Bytes(b)) => {
            integer_from_bignum(tag, b).map(CborValue::Integer)
        }
        (TAG_DECIMAL, CborValue::Array(items)) => match items.as_slice() {
            [CborValue::Integer(exponent), mantissa] => {
                let exponent = i64::try_from(*exponent).ok()?;
                let mantissa = big_integer(mantissa)?;
                Some(CborValue::Decimal(Decimal::new(mantissa, exponent)))
            }
            _ => None,
        },
        (TAG_FRACTION, CborValue::Array(items)) => match items.as_slice() {
            [numer, denom] => {
                Fraction::new(big_integer(numer)?, big_integer(denom)?).map(CborValue::Fraction)
            }
            _ => None,
        },
        (TAG_REGEX, CborValue::Text(s)) => Pattern::new(s).ok().map(CborValue::Regex),
        (TAG_MIME, CborValue::Text(s)) => Some(CborValue::Mime(MimeMessage::new(s.as_str()))),
        (TAG_UUID, CborValue::Bytes(b)) => Uuid::from_slice(b).ok().map(CborValue::Uuid),
        (TAG_IP_ADDRESS, CborValue::Bytes(b)) => ip_from_bytes(b).map(CborValue::IpAddress),
        (TAG_IP_NETWORK, CborValue::Map(map)) if map.len() == 1 => {
            map.iter().next().and_then(|(addr, prefix)| match (addr, prefix) {
                (CborValue::Bytes(addr), CborValue::Integer(prefix)) => {
                    let prefix = u8::try_from(*prefix).ok()?;
                    IpNetwork::new(ip_from_bytes(addr)?, prefix)
                }
                _ => None,
            })
            .map(CborValue::IpNetwork)
        }
        _ => None,
    }
}

fn epoch_float_datetime(secs: f64) -> Option<DateTime<FixedOffset>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let mut nanos = ((secs - whole) * 1e9).round() as u32;
    let mut whole = whole as i64;
    if nanos >= 1_000_000_000 {
        whole += 1;
        nanos -= 1_000_000_000;
    }
    DateTime::from_timestamp(whole, nanos).map(|dt| dt.fixed_offset())
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    <[u8; 16]>::try_from(bytes)
        .ok()
        .map(|octets| IpAddr::V6(Ipv6Addr::from(octets)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Set;

    fn dec(hex: &str) -> Result<CborValue, CborError> {
        decode(&hex::decode(hex).unwrap(), 16)
    }

    #[test]
    fn integers_and_bignums() {
        assert_eq!(dec("1b000000e8d4a51000").unwrap(), CborValue::Integer(1_000_000_000_000));
        assert_eq!(
            dec("3bffffffffffffffff").unwrap(),
            CborValue::Integer(-18446744073709551616)
        );
        assert_eq!(
            dec("c249010000000000000000").unwrap(),
            CborValue::Integer(18446744073709551616)
        );
        let huge = format!("c251{}", "01".repeat(17));
        assert!(matches!(dec(&huge).unwrap(), CborValue::Tagged(t) if t.tag == 2));
    }

    #[test]
    fn indefinite_lengths() {
        assert_eq!(
            dec("5f42010243030405ff").unwrap(),
            CborValue::Bytes(vec![1, 2, 3, 4, 5])
        );
        assert_eq!(
            dec("7f657374726561646d696e67ff").unwrap(),
            CborValue::Text("streaming".into())
        );
        assert_eq!(
            dec("9f018202039f0405ffff").unwrap(),
            dec("8301820203820405").unwrap()
        );
        let map = dec("bf61610161629f0203ffff").unwrap();
        let CborValue::Map(map) = map else {
            panic!("expected map")
        };
        assert_eq!(map.get(&CborValue::Text("a".into())), Some(&CborValue::Integer(1)));
    }

    #[test]
    fn keys_and_members_are_frozen() {
        let CborValue::Map(map) = dec("a1820102f5").unwrap() else {
            panic!("expected map")
        };
        assert_eq!(
            map.get(&CborValue::Tuple(vec![CborValue::Integer(1), CborValue::Integer(2)])),
            Some(&CborValue::Bool(true))
        );
        let CborValue::Set(set) = dec("d9010281d9010280").unwrap() else {
            panic!("expected set")
        };
        assert!(set.contains(&CborValue::FrozenSet(Set::new())));
    }

    #[test]
    fn semantic_tags() {
        let dt = dec("c074323031332d30332d32315432303a30343a30305a").unwrap();
        assert_eq!(dt, dec("c11a514b67b0").unwrap());
        let CborValue::DateTime(fractional) = dec("c1fb41d452d9ec200000").unwrap() else {
            panic!("expected datetime")
        };
        assert_eq!(fractional.timestamp_subsec_millis(), 500);
        assert_eq!(
            dec("c482200f").unwrap(),
            CborValue::Decimal("1.5".parse().unwrap())
        );
        assert_eq!(
            dec("d81e820103").unwrap(),
            CborValue::Fraction(Fraction::new(1, 3).unwrap())
        );
        assert_eq!(
            dec("d901044401020304").unwrap(),
            CborValue::IpAddress("1.2.3.4".parse().unwrap())
        );
        assert_eq!(
            dec("d90105a1440a0000001821").unwrap().type_name(),
            "tagged value"
        );
        assert_eq!(
            dec("d90105a1440a0000001818").unwrap(),
            CborValue::IpNetwork("10.0.0.0/24".parse().unwrap())
        );
        assert_eq!(dec("d9d9f7f6").unwrap(), CborValue::Null);
        // A fraction with a zero denominator stays a generic tag.
        assert!(matches!(dec("d81e820100").unwrap(), CborValue::Tagged(t) if t.tag == 30));
    }

    #[test]
    fn bignum_parts_of_decimals_and_fractions() {
        let two_128 = format!("c251{}", "01".to_owned() + &"00".repeat(16));
        let decimal = format!("c48200c351{}", "01".to_owned() + &"00".repeat(16));
        assert_eq!(
            dec(&decimal).unwrap(),
            CborValue::Decimal("-340282366920938463463374607431768211457".parse().unwrap())
        );
        let fraction = format!("d81e8201{two_128}");
        assert_eq!(
            dec(&fraction).unwrap(),
            CborValue::Fraction("1/340282366920938463463374607431768211456".parse().unwrap())
        );
        for hex in [decimal, fraction] {
            let bytes = hex::decode(&hex).unwrap();
            assert_eq!(crate::cbor::encode(&decode(&bytes, 16).unwrap()), bytes);
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(dec("18"), Err(CborError::UnexpectedEof(1)));
        assert_eq!(dec("0000"), Err(CborError::TrailingBytes(1)));
        assert!(matches!(dec("62ffff"), Err(CborError::InvalidPayload(_))));
        assert!(matches!(dec("f810"), Err(CborError::InvalidPayload(_))));
        assert!(matches!(dec("ff"), Err(CborError::InvalidPayload(_))));
        assert!(matches!(dec("1c"), Err(CborError::InvalidPayload(_))));
        let deep = "81".repeat(17) + "00";
        assert_eq!(dec(&deep), Err(CborError::DepthLimit(16)));
        assert!(dec(&("81".repeat(16) + "00")).is_ok());
    }
}
