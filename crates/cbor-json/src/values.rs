//! Small scalar kinds carried by both value models.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::ParseError;

/// A CBOR simple value (major type 7) that is not a bool, null or undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimpleValue(u8);

impl SimpleValue {
    /// Accepts 0..=19 and 32..=255; 20..=23 are false/true/null/undefined
    /// and 24..=31 are reserved by CBOR.
    pub fn new(value: u8) -> Option<Self> {
        match value {
            0..=19 | 32..=255 => Some(Self(value)),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// A compiled regular expression, compared by its pattern text.
#[derive(Clone)]
pub struct Pattern(regex::Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn regex(&self) -> &regex::Regex {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl From<regex::Regex> for Pattern {
    fn from(re: regex::Regex) -> Self {
        Self(re)
    }
}

/// Raw text of a MIME message (headers, blank line, body).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeMessage(String);

impl MimeMessage {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Drops leading line feeds, which the serialized form never starts with.
    pub fn normalized(&self) -> MimeMessage {
        MimeMessage(self.0.trim_start_matches('\n').to_owned())
    }
}

/// An IPv4 or IPv6 network: address with the host bits cleared, plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    /// Returns `None` when `prefix` exceeds the address width. Host bits of
    /// `addr` are masked off.
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        let addr = match addr {
            IpAddr::V4(v4) => {
                if prefix > 32 {
                    return None;
                }
                let mask = u32::MAX.checked_shl(32 - prefix as u32).unwrap_or(0);
                IpAddr::V4((u32::from(v4) & mask).into())
            }
            IpAddr::V6(v6) => {
                if prefix > 128 {
                    return None;
                }
                let mask = u128::MAX.checked_shl(128 - prefix as u32).unwrap_or(0);
                IpAddr::V6((u128::from(v6) & mask).into())
            }
        };
        Some(Self { addr, prefix })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for IpNetwork {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::IpNetwork(s.to_owned());
        let (addr, prefix) = s.split_once('/').ok_or_else(bad)?;
        let addr: IpAddr = addr.parse().map_err(|_| bad())?;
        let prefix: u8 = prefix.parse().map_err(|_| bad())?;
        IpNetwork::new(addr, prefix).ok_or_else(|| ParseError::PrefixTooLong(s.to_owned()))
    }
}

/// Hashes a float in agreement with `==`, so `0.0` and `-0.0` collide.
pub(crate) fn hash_float<H: Hasher>(float: f64, state: &mut H) {
    let bits = if float == 0.0 { 0 } else { float.to_bits() };
    bits.hash(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_value_rejects_reserved_range() {
        assert!(SimpleValue::new(16).is_some());
        assert!(SimpleValue::new(255).is_some());
        for v in 20..=31 {
            assert!(SimpleValue::new(v).is_none(), "{v}");
        }
    }

    #[test]
    fn network_masks_host_bits() {
        let net: IpNetwork = "192.168.1.77/24".parse().unwrap();
        assert_eq!(net.to_string(), "192.168.1.0/24");
        let net: IpNetwork = "2001:db8::1/32".parse().unwrap();
        assert_eq!(net.to_string(), "2001:db8::/32");
        let any: IpNetwork = "10.1.2.3/0".parse().unwrap();
        assert_eq!(any.to_string(), "0.0.0.0/0");
        assert_eq!(
            "10.0.0.0/33".parse::<IpNetwork>(),
            Err(ParseError::PrefixTooLong("10.0.0.0/33".to_owned()))
        );
        assert_eq!(
            "10.0.0.0".parse::<IpNetwork>(),
            Err(ParseError::IpNetwork("10.0.0.0".to_owned()))
        );
    }

    #[test]
    fn mime_normalization_strips_leading_newlines() {
        let msg = MimeMessage::new("\n\nSubject: hi\n\nbody");
        assert_eq!(msg.normalized().as_str(), "Subject: hi\n\nbody");
    }
}
