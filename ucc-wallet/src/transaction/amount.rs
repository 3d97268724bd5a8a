//! Display/minimal-unit amount conversion
//!
//! All arithmetic is exact integer math on `U256`; no floating point is
//! involved in either direction.

use ethers_core::types::U256;

use crate::error::{Error, Result};

/// Largest power of ten representable in a U256
const MAX_DECIMALS: u32 = 77;

/// Parse a user-entered display amount into minimal units.
///
/// Fractional digits beyond `decimals` are truncated toward zero, so
/// `"1.9999999999999999999"` at 18 decimals is `1999999999999999999`.
/// Empty, signed, exponent, non-numeric, zero and overflowing input is
/// rejected.
pub fn parse_display_amount(input: &str, decimals: u32) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(Error::InvalidAmount(format!("unsupported decimals: {}", decimals)));
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidAmount("amount is empty".to_string()));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::InvalidAmount(format!("not a number: {}", trimmed)));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("not a decimal number: {}", trimmed)));
    }

    let overflow = || Error::InvalidAmount(format!("amount too large: {}", trimmed));

    let whole_units = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| overflow())?
    };

    let kept: String = fraction.chars().take(decimals as usize).collect();
    let padded = format!("{:0<width$}", kept, width = decimals as usize);
    let fraction_units = if padded.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(&padded).map_err(|_| overflow())?
    };

    let units = whole_units
        .checked_mul(U256::exp10(decimals as usize))
        .and_then(|scaled| scaled.checked_add(fraction_units))
        .ok_or_else(overflow)?;

    if units.is_zero() {
        return Err(Error::InvalidAmount("amount must be greater than zero".to_string()));
    }

    Ok(units)
}

/// Render minimal units as a display amount with exactly `places` decimals, truncated
pub fn format_display_amount(units: U256, decimals: u32, places: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let divisor = U256::exp10(decimals as usize);
    let whole = units / divisor;

    if places == 0 {
        return whole.to_string();
    }

    let remainder = units % divisor;
    let fraction = if decimals == 0 {
        String::new()
    } else {
        format!("{:0>width$}", remainder.to_string(), width = decimals as usize)
    };

    let mut shown: String = fraction.chars().take(places as usize).collect();
    while shown.len() < places as usize {
        shown.push('0');
    }

    format!("{}.{}", whole, shown)
}
