use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::One;
use num_traits::Zero;
use serde::Deserialize;
use serde::Serialize;

/// A raw (base-unit) token amount, bounded by `2^256 - 1` like an ERC20
/// balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenAmount(BigUint);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// `2^256 - 1`, the allowance granted by an unlimited ERC20 approval.
    pub fn max_uint256() -> Self {
        Self((BigUint::one() << 256usize) - BigUint::one())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// saturating at [`Self::max_uint256`]
    pub fn saturating_add(&self, other: &Self) -> Self {
        let sum = &self.0 + &other.0;
        let max = Self::max_uint256();
        if sum > max.0 {
            max
        } else {
            Self(sum)
        }
    }

    /// renders the amount as a decimal number using `decimals` fraction digits.
    ///
    /// trailing zeros of the fraction are dropped, eg 1500000 with 6 decimals
    /// renders as `1.5`.
    pub fn format_units(&self, decimals: u8) -> String {
        let digits = self.0.to_str_radix(10);
        let decimals = usize::from(decimals);
        if decimals == 0 {
            return digits;
        }
        let padded = format!("{:0>width$}", digits, width = decimals + 1);
        let (whole, fraction) = padded.split_at(padded.len() - decimals);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for TokenAmount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(&rhs)
    }
}

impl<'a> Add<&'a TokenAmount> for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: &'a TokenAmount) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a TokenAmount> for TokenAmount {
    fn sum<I: Iterator<Item = &'a TokenAmount>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid token amount: {0:?}")]
pub struct InvalidAmount(String);

impl FromStr for TokenAmount {
    type Err = InvalidAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigUint::from_str(s.trim()).map_err(|_| InvalidAmount(s.to_string()))?;
        if value > Self::max_uint256().0 {
            return Err(InvalidAmount(s.to_string()));
        }
        Ok(Self(value))
    }
}

impl TokenAmount {
    /// parses a decimal string such as `1.25` into base units.
    pub fn parse_units(s: &str, decimals: u8) -> Result<Self, InvalidAmount> {
        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if fraction.len() > usize::from(decimals)
            || (whole.is_empty() && fraction.is_empty())
            || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
        {
            return Err(InvalidAmount(s.to_string()));
        }
        let digits = format!(
            "{}{:0<width$}",
            if whole.is_empty() { "0" } else { whole },
            fraction,
            width = usize::from(decimals)
        );
        digits.parse()
    }
}
