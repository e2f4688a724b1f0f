//! Core type definitions for the planner
//!
//! Amounts are always held in the smallest on-chain unit (yoctoNEAR for the
//! native coin, the token's base unit for fungible tokens) as arbitrary
//! precision integers. Nothing in this crate touches floating point.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// NEAR account identifier (named or implicit)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors from parsing amounts and rates out of strings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("invalid character '{0}' in amount")]
    InvalidCharacter(char),

    #[error("amount has more than one decimal point")]
    MultipleDecimalPoints,
}

/// Non-negative integer amount in smallest units.
///
/// Serialized as a base-10 integer string so 24-decimal values survive
/// JSON round trips without precision loss.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// `self - other`, floored at zero
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        if self.0 > other.0 {
            Self(&self.0 - &other.0)
        } else {
            Self::zero()
        }
    }

    pub fn min_of(a: &Amount, b: &Amount) -> Amount {
        if a <= b {
            a.clone()
        } else {
            b.clone()
        }
    }

    /// Parse a human decimal string (e.g. "1.25") into smallest units.
    ///
    /// Fraction digits beyond `decimals` are truncated toward zero.
    pub fn parse_decimal(input: &str, decimals: u32) -> Result<Self, AmountParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, fraction) = match input.split_once('.') {
            Some((w, f)) => {
                if f.contains('.') {
                    return Err(AmountParseError::MultipleDecimalPoints);
                }
                (w, f)
            }
            None => (input, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::Empty);
        }

        for c in whole.chars().chain(fraction.chars()) {
            if !c.is_ascii_digit() {
                return Err(AmountParseError::InvalidCharacter(c));
            }
        }

        let mut fraction: String = fraction.chars().take(decimals as usize).collect();
        while fraction.len() < decimals as usize {
            fraction.push('0');
        }

        let digits = format!("{}{}", whole, fraction);
        if digits.is_empty() {
            return Ok(Self::zero());
        }

        BigUint::parse_bytes(digits.as_bytes(), 10)
            .map(Self)
            .ok_or(AmountParseError::Empty)
    }

    /// Render as a human decimal string with trailing zeros trimmed
    pub fn format_decimal(&self, decimals: u32) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }

        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
        } else {
            digits
        };

        let (whole, fraction) = padded.split_at(padded.len() - decimals);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    /// Parse an integer string in smallest units
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_digit()) {
            return Err(AmountParseError::InvalidCharacter(c));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or(AmountParseError::Empty)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for &Amount {
    type Output = Amount;

    /// Saturating: never underflows below zero
    fn sub(self, rhs: &Amount) -> Amount {
        self.saturating_sub(rhs)
    }
}

/// Exact decimal conversion rate (native value per one token unit).
///
/// Stored as `mantissa / 10^scale` with trailing zeros stripped so equal
/// rates compare equal regardless of how they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversionRate {
    mantissa: BigUint,
    scale: u32,
}

impl ConversionRate {
    pub fn one() -> Self {
        Self {
            mantissa: BigUint::one(),
            scale: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    fn denominator(&self) -> BigUint {
        BigUint::from(10u32).pow(self.scale)
    }

    /// `floor(amount * rate)`
    pub fn mul_floor(&self, amount: &Amount) -> Amount {
        Amount((amount.as_biguint() * &self.mantissa) / self.denominator())
    }

    /// `floor(amount / rate)`, or `None` for a zero rate
    pub fn div_floor(&self, amount: &Amount) -> Option<Amount> {
        if self.is_zero() {
            return None;
        }
        Some(Amount(
            (amount.as_biguint() * self.denominator()) / &self.mantissa,
        ))
    }

    pub fn cmp_one(&self) -> Ordering {
        self.mantissa.cmp(&self.denominator())
    }
}

impl FromStr for ConversionRate {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if fraction.contains('.') {
            return Err(AmountParseError::MultipleDecimalPoints);
        }
        if let Some(c) = whole.chars().chain(fraction.chars()).find(|c| !c.is_ascii_digit()) {
            return Err(AmountParseError::InvalidCharacter(c));
        }

        let fraction = fraction.trim_end_matches('0');
        let digits = format!("{}{}", whole, fraction);
        let mantissa = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or(AmountParseError::Empty)?;

        Ok(Self {
            mantissa,
            scale: fraction.len() as u32,
        })
    }
}

impl TryFrom<String> for ConversionRate {
    type Error = AmountParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConversionRate> for String {
    fn from(value: ConversionRate) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Amount(self.mantissa.clone()).format_decimal(self.scale))
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nanosecond timestamp as reported by the chain
pub type TimestampNs = u64;

/// Constants
pub mod constants {
    /// NEAR has 24 decimal places
    pub const NEAR_DECIMALS: u32 = 24;

    /// 1 NEAR in yoctoNEAR
    pub const YOCTO_PER_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

    /// Native balance kept back for gas when locking NEAR (0.25 NEAR)
    pub const DEFAULT_GAS_RESERVE_YOCTO: u128 = 250_000_000_000_000_000_000_000;

    /// Balances under this are treated as leftover dust (0.000001 NEAR)
    pub const DEFAULT_DUST_THRESHOLD_YOCTO: u128 = 1_000_000_000_000_000_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_whole_and_fraction() {
        let amount = Amount::parse_decimal("1.5", 24).unwrap();
        assert_eq!(amount.to_string(), "1500000000000000000000000");

        let amount = Amount::parse_decimal(".25", 2).unwrap();
        assert_eq!(amount, Amount::from(25));

        let amount = Amount::parse_decimal("7", 0).unwrap();
        assert_eq!(amount, Amount::from(7));
    }

    #[test]
    fn test_parse_decimal_truncates_excess_precision() {
        let amount = Amount::parse_decimal("0.129", 2).unwrap();
        assert_eq!(amount, Amount::from(12));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Amount::parse_decimal("", 24), Err(AmountParseError::Empty));
        assert_eq!(Amount::parse_decimal(".", 24), Err(AmountParseError::Empty));
        assert_eq!(
            Amount::parse_decimal("-1", 24),
            Err(AmountParseError::InvalidCharacter('-'))
        );
        assert_eq!(
            Amount::parse_decimal("1e5", 24),
            Err(AmountParseError::InvalidCharacter('e'))
        );
        assert_eq!(
            Amount::parse_decimal("1.2.3", 24),
            Err(AmountParseError::MultipleDecimalPoints)
        );
        assert!(Amount::parse_decimal("NaN", 24).is_err());
    }

    #[test]
    fn test_format_decimal() {
        let amount: Amount = "1500000000000000000000000".parse().unwrap();
        assert_eq!(amount.format_decimal(24), "1.5");
        assert_eq!(Amount::from(5).format_decimal(3), "0.005");
        assert_eq!(Amount::zero().format_decimal(24), "0");
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let amount = Amount::from(constants::YOCTO_PER_NEAR);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000000000\"");

        let parsed: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, amount);

        assert!(serde_json::from_str::<Amount>("\"1.5\"").is_err());
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Amount::from(4);
        let b = Amount::from(5);
        assert_eq!(a.saturating_sub(&b), Amount::zero());
        assert_eq!(&b - &a, Amount::from(1));
    }

    #[test]
    fn test_conversion_rate_normalizes_trailing_zeros() {
        let a: ConversionRate = "1.2500".parse().unwrap();
        let b: ConversionRate = "1.25".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1.25");
        assert_eq!(a.cmp_one(), Ordering::Greater);
    }

    #[test]
    fn test_conversion_rate_mul_and_div() {
        let rate: ConversionRate = "1.5".parse().unwrap();
        let value = rate.mul_floor(&Amount::from(10));
        assert_eq!(value, Amount::from(15));
        assert_eq!(rate.div_floor(&value), Some(Amount::from(10)));

        let zero: ConversionRate = "0".parse().unwrap();
        assert!(zero.div_floor(&Amount::from(1)).is_none());
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Testnet.as_str(), "testnet");
    }
}
