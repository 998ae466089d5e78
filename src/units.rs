//! Amount Unit Conversion
//!
//! Payment amounts travel as decimal strings (`"2.5"`) in links and forms and
//! as integers in the contract's smallest unit. Both assets use 18 decimals.

use crate::error::PlinksError;
use ethers_core::types::U256;
use thiserror::Error;

/// Decimal places of the contract's amount unit
pub const DECIMALS: usize = 18;

/// Amount conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places: {0} (max {max})", max = DECIMALS)]
    TooManyDecimals(usize),

    #[error("Amount overflow")]
    Overflow,
}

impl From<UnitsError> for PlinksError {
    fn from(e: UnitsError) -> Self {
        PlinksError::validation(e.to_string())
    }
}

/// Parse a decimal string into the smallest unit
pub fn parse_units(amount: &str) -> Result<U256, UnitsError> {
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::InvalidFormat(amount.to_string()));
    }

    if fraction.len() > DECIMALS {
        return Err(UnitsError::TooManyDecimals(fraction.len()));
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| UnitsError::Overflow)?
    };

    // Pad fractional part to full precision
    let padded = format!("{:0<width$}", fraction, width = DECIMALS);
    let fraction = U256::from_dec_str(&padded).map_err(|_| UnitsError::Overflow)?;

    whole
        .checked_mul(U256::exp10(DECIMALS))
        .and_then(|v| v.checked_add(fraction))
        .ok_or(UnitsError::Overflow)
}

/// Format a smallest-unit integer as a decimal string
///
/// Always keeps at least one fractional digit: `10^18` formats as `"1.0"`.
pub fn format_units(raw: U256) -> String {
    let multiplier = U256::exp10(DECIMALS);
    let integer = raw / multiplier;
    let fractional = raw % multiplier;

    let frac_str = format!("{:0>width$}", fractional.to_string(), width = DECIMALS);
    let trimmed = frac_str.trim_end_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{}.{}", integer, trimmed)
}
