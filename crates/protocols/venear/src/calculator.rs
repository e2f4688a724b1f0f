//! veNEAR amount calculator
//!
//! Pure functions over integer amounts in smallest units.
//! No I/O, no async, no floating point.
//!
//! # Units
//!
//! - NEAR amounts: yoctoNEAR, 1 NEAR = 10^24 yoctoNEAR
//! - Liquid staking tokens: the token's base unit (24 decimals for all
//!   supported LSTs)
//! - Conversion rates: exact decimals, native value per one token unit

use serde::{Deserialize, Serialize};
use venear_core::{Amount, AmountParseError, ConversionRate, ValidationError};

use crate::state::AssetKind;

/// Native value of a wrapped-token amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeValue {
    /// Zero when the rate is unavailable
    pub amount: Amount,
    /// False while the conversion rate is unavailable; show a pending state
    /// rather than a confident zero
    pub available: bool,
}

impl NativeValue {
    pub fn exact(amount: Amount) -> Self {
        Self {
            amount,
            available: true,
        }
    }

    pub fn pending() -> Self {
        Self {
            amount: Amount::zero(),
            available: false,
        }
    }
}

/// Result of entered-amount validation; the parsed amount on success
pub type ValidationResult = Result<Amount, ValidationError>;

/// Parse a human-entered decimal ("1.5") into smallest units.
///
/// Digits beyond `decimals` are truncated.
pub fn parse_amount(input: &str, decimals: u32) -> Result<Amount, AmountParseError> {
    Amount::parse_decimal(input, decimals)
}

/// Render smallest units as a decimal string without trailing zeros
pub fn format_amount(amount: &Amount, decimals: u32) -> String {
    amount.format_decimal(decimals)
}

/// Treat negligible leftovers as zero
pub fn filter_dust(amount: &Amount, threshold: &Amount) -> Amount {
    if amount < threshold {
        Amount::zero()
    } else {
        amount.clone()
    }
}

/// Convert a wrapped-token amount to native value, rounding down.
///
/// A missing rate is a soft failure: the value is zero and flagged unavailable.
pub fn convert_to_native_value(amount: &Amount, rate: Option<&ConversionRate>) -> NativeValue {
    match rate {
        Some(rate) => NativeValue::exact(rate.mul_floor(amount)),
        None => NativeValue::pending(),
    }
}

/// Inverse of [`convert_to_native_value`], rounding down.
///
/// Returns `None` for a missing or zero rate.
pub fn convert_from_native_value(
    native: &Amount,
    rate: Option<&ConversionRate>,
) -> Option<Amount> {
    rate.and_then(|r| r.div_floor(native))
}

/// Deposits still owed for onboarding.
///
/// Once registration and deployment have happened this is zero, so a retried
/// onboarding never pays either cost twice.
pub fn compute_deposit_total(
    is_registered: bool,
    is_lockup_deployed: bool,
    registration_cost: &Amount,
    deployment_cost: &Amount,
) -> Amount {
    let mut total = Amount::zero();
    if !is_registered {
        total = &total + registration_cost;
    }
    if !is_lockup_deployed {
        total = &total + deployment_cost;
    }
    total
}

/// Max amount of an asset that can be locked.
///
/// Gas is paid from the wallet's NEAR, so only the native coin withholds the
/// gas reserve.
pub fn compute_max_lockable(balance: &Amount, kind: AssetKind, gas_reserve: &Amount) -> Amount {
    match kind {
        AssetKind::NativeCoin => balance.saturating_sub(gas_reserve),
        AssetKind::LiquidStakingToken | AssetKind::LockupHeldCoin => balance.clone(),
    }
}

/// Max amount that can begin unlocking
pub fn compute_max_unlockable(locked: &Amount, dust_threshold: &Amount) -> Amount {
    filter_dust(locked, dust_threshold)
}

/// Max amount the lockup can stake from its liquid balance
pub fn compute_max_stakable(liquid_stakable: &Amount, dust_threshold: &Amount) -> Amount {
    filter_dust(liquid_stakable, dust_threshold)
}

/// Validate a human-entered decimal amount against a max and optional floor.
///
/// Checks, in order: positive decimal format, `entered <= max`, and
/// `entered >= minimum` when a minimum applies.
pub fn validate_entered_amount(
    entered: &str,
    decimals: u32,
    max: &Amount,
    minimum: Option<&Amount>,
) -> ValidationResult {
    let amount = parse_amount(entered, decimals).map_err(|_| ValidationError::InvalidFormat {
        input: entered.to_string(),
    })?;

    if amount.is_zero() {
        return Err(ValidationError::InvalidFormat {
            input: entered.to_string(),
        });
    }

    if &amount > max {
        return Err(ValidationError::InsufficientFunds {
            requested: amount,
            available: max.clone(),
        });
    }

    if let Some(minimum) = minimum {
        if &amount < minimum {
            return Err(ValidationError::BelowMinimum {
                minimum: minimum.clone(),
                entered: amount,
            });
        }
    }

    Ok(amount)
}
