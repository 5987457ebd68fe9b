//! Exact rational numbers of any size.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::error::ParseError;

/// A rational number in lowest terms with a positive denominator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fraction(BigRational);

impl Fraction {
    /// Reduces `numer/denom`; `None` for a zero denominator.
    pub fn new(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Option<Self> {
        let denom = denom.into();
        if denom.is_zero() {
            return None;
        }
        Some(Self(BigRational::new(numer.into(), denom)))
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }
}

impl From<BigRational> for Fraction {
    fn from(ratio: BigRational) -> Self {
        Self(ratio)
    }
}

/// Always `numer/denom`, including a denominator of 1.
impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer(), self.denom())
    }
}

impl FromStr for Fraction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Fraction(s.to_owned());
        let (numer, denom) = s.split_once('/').ok_or_else(bad)?;
        let numer: BigInt = numer.trim().parse().map_err(|_| bad())?;
        let denom: BigInt = denom.trim().parse().map_err(|_| bad())?;
        Fraction::new(numer, denom).ok_or_else(|| ParseError::ZeroDenominator(s.to_owned()))
    }
}
