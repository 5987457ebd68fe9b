//! Arbitrary-precision decimal numbers.
//!
//! A finite value is `±coefficient * 10^exponent` with an unbounded
//! coefficient. The textual form is the General Decimal Arithmetic
//! "to-scientific-string" form, so trailing zeros and the sign of zero are
//! significant: `1.50`, `1.5` and `-0` are all kept apart. Infinities and
//! quiet or signaling NaNs are carried too.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Kind {
    Finite { coefficient: BigUint, exponent: i64 },
    Infinity,
    NaN { signaling: bool, payload: BigUint },
}

impl Decimal {
    /// `mantissa * 10^exponent`. Use [`from_parts`](Self::from_parts) for `-0`.
    pub fn new(mantissa: impl Into<BigInt>, exponent: i64) -> Self {
        let mantissa = mantissa.into();
        Self::from_parts(
            mantissa.sign() == Sign::Minus,
            mantissa.magnitude().clone(),
            exponent,
        )
    }

    pub fn from_parts(negative: bool, coefficient: BigUint, exponent: i64) -> Self {
        Self {
            negative,
            kind: Kind::Finite {
                coefficient,
                exponent,
            },
        }
    }

    pub fn infinity(negative: bool) -> Self {
        Self {
            negative,
            kind: Kind::Infinity,
        }
    }

    pub fn nan() -> Self {
        Self {
            negative: false,
            kind: Kind::NaN {
                signaling: false,
                payload: BigUint::zero(),
            },
        }
    }

    pub fn signaling_nan() -> Self {
        Self {
            negative: false,
            kind: Kind::NaN {
                signaling: true,
                payload: BigUint::zero(),
            },
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.kind, Kind::Finite { .. })
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.kind, Kind::Infinity)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.kind, Kind::NaN { .. })
    }

    /// Signed coefficient of a finite value. `-0` reads as `0`.
    pub fn mantissa(&self) -> Option<BigInt> {
        match &self.kind {
            Kind::Finite { coefficient, .. } => {
                let sign = if self.negative { Sign::Minus } else { Sign::Plus };
                Some(BigInt::from_biguint(sign, coefficient.clone()))
            }
            _ => None,
        }
    }

    pub fn exponent(&self) -> Option<i64> {
        match &self.kind {
            Kind::Finite { exponent, .. } => Some(*exponent),
            _ => None,
        }
    }
}

fn write_scientific(f: &mut fmt::Formatter<'_>, digits: &str, exponent: i64) -> fmt::Result {
    let len = digits.len() as i128;
    let exp = exponent as i128;
    let adjusted = exp + len - 1;

    if exp <= 0 && adjusted >= -6 {
        if exp == 0 {
            return f.write_str(digits);
        }
        let point = len + exp;
        if point > 0 {
            let (int, frac) = digits.split_at(point as usize);
            write!(f, "{int}.{frac}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat((-point) as usize))
        }
    } else {
        let (first, rest) = digits.split_at(1);
        f.write_str(first)?;
        if !rest.is_empty() {
            write!(f, ".{rest}")?;
        }
        write!(f, "E{adjusted:+}")
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        match &self.kind {
            Kind::Finite {
                coefficient,
                exponent,
            } => write_scientific(f, &coefficient.to_string(), *exponent),
            Kind::Infinity => f.write_str("Infinity"),
            Kind::NaN { signaling, payload } => {
                if *signaling {
                    f.write_str("s")?;
                }
                f.write_str("NaN")?;
                if !payload.is_zero() {
                    write!(f, "{payload}")?;
                }
                Ok(())
            }
        }
    }
}

fn parse_digits(digits: &str) -> Option<BigUint> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
}

impl FromStr for Decimal {
    type Err = ParseError;

    /// Accepts the usual decimal literals plus `Infinity`/`Inf`, `NaN` and
    /// `sNaN` (case-insensitive, optional NaN payload digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Decimal(s.to_owned());
        let text = s.trim().to_ascii_lowercase();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text.as_str()),
        };

        if body == "inf" || body == "infinity" {
            return Ok(Decimal::infinity(negative));
        }
        for (prefix, signaling) in [("snan", true), ("nan", false)] {
            if let Some(payload) = body.strip_prefix(prefix) {
                let payload = if payload.is_empty() {
                    BigUint::zero()
                } else {
                    parse_digits(payload).ok_or_else(bad)?
                };
                return Ok(Decimal {
                    negative,
                    kind: Kind::NaN { signaling, payload },
                });
            }
        }

        let (number, exp_part) = match body.split_once('e') {
            Some((number, exp)) => (number, Some(exp)),
            None => (body, None),
        };
        let (int, frac) = number.split_once('.').unwrap_or((number, ""));
        let coefficient = parse_digits(&format!("{int}{frac}")).ok_or_else(bad)?;
        let exponent: i64 = match exp_part {
            Some(e) => e.parse().map_err(|_| bad())?,
            None => 0,
        };
        let exponent = i64::try_from(frac.len())
            .ok()
            .and_then(|len| exponent.checked_sub(len))
            .ok_or_else(bad)?;
        Ok(Decimal::from_parts(negative, coefficient, exponent))
    }
}
