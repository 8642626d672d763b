// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Amounts: native drops and issued-currency values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::currency::{currency_bytes, encode_currency};
use super::keys::decode_address;
use super::LedgerError;

/// 1 XRP in drops.
pub const DROPS_PER_XRP: u64 = 1_000_000;
/// Total native supply in drops; no valid amount exceeds it.
pub const MAX_DROPS: u64 = 100_000_000_000 * DROPS_PER_XRP;

const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
const MAX_MANTISSA: u64 = 9_999_999_999_999_999;
const MIN_EXPONENT: i32 = -96;
const MAX_EXPONENT: i32 = 80;
const NOT_NATIVE_BIT: u64 = 0x8000_0000_0000_0000;
const POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;

/// Issued-currency amount. `currency` holds the human code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IssuedAmount {
    pub currency: String,
    pub issuer: String,
    pub value: String,
}

/// A validated transaction amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Drops(u64),
    Issued(IssuedAmount),
}

impl Amount {
    /// Parse a drops string (`^\d+$`).
    pub fn drops(raw: &str) -> Result<Self, LedgerError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidAmount(format!(
                "drops must be a non-negative integer string, got '{raw}'"
            )));
        }
        let drops: u64 = raw
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(format!("drops out of range: '{raw}'")))?;
        if drops > MAX_DROPS {
            return Err(LedgerError::InvalidAmount(format!(
                "drops exceeds total supply: '{raw}'"
            )));
        }
        Ok(Self::Drops(drops))
    }

    /// Build an issued amount after validating every component.
    pub fn issued(currency: &str, issuer: &str, value: &str) -> Result<Self, LedgerError> {
        validate_value(value)?;
        encode_currency(currency)?;
        decode_address(issuer)?;
        Ok(Self::Issued(IssuedAmount {
            currency: currency.to_string(),
            issuer: issuer.to_string(),
            value: value.to_string(),
        }))
    }

    /// Wire JSON: a drops string, or `{currency, issuer, value}` with the
    /// currency passed through the codec.
    pub fn to_json(&self) -> Result<Value, LedgerError> {
        match self {
            Self::Drops(drops) => Ok(Value::String(drops.to_string())),
            Self::Issued(issued) => Ok(json!({
                "currency": encode_currency(&issued.currency)?,
                "issuer": issued.issuer,
                "value": issued.value,
            })),
        }
    }

    /// Canonical binary form used inside serialized transactions.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        match self {
            Self::Drops(drops) => {
                if *drops > MAX_DROPS {
                    return Err(LedgerError::InvalidAmount(drops.to_string()));
                }
                Ok((POSITIVE_BIT | drops).to_be_bytes().to_vec())
            }
            Self::Issued(issued) => {
                let mut out = Vec::with_capacity(48);
                out.extend_from_slice(&encode_issued_value(&issued.value)?.to_be_bytes());
                out.extend_from_slice(&currency_bytes(&issued.currency)?);
                out.extend_from_slice(&decode_address(&issued.issuer)?);
                Ok(out)
            }
        }
    }
}

/// Issued value format: `^\d+(\.\d+)?$`.
pub fn validate_value(value: &str) -> Result<(), LedgerError> {
    let (int, frac) = match value.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(int) || frac.is_some_and(|f| !digits(f)) {
        return Err(LedgerError::InvalidAmount(format!(
            "value must be a positive decimal string, got '{value}'"
        )));
    }
    Ok(())
}

/// Convert a decimal XRP string to drops, rounding half up at the sixth
/// decimal place.
pub fn xrp_to_drops(value: &str) -> Result<u64, LedgerError> {
    validate_value(value)?;
    let (int, frac) = value.split_once('.').unwrap_or((value, ""));

    let mut frac_digits: Vec<u8> = frac.bytes().map(|b| b - b'0').collect();
    let round_up = frac_digits.get(6).is_some_and(|d| *d >= 5);
    frac_digits.resize(6, 0);

    let whole: u64 = int
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(format!("XRP value out of range: '{value}'")))?;
    let fraction = frac_digits
        .iter()
        .fold(0u64, |acc, d| acc * 10 + u64::from(*d));

    let drops = whole
        .checked_mul(DROPS_PER_XRP)
        .and_then(|d| d.checked_add(fraction))
        .and_then(|d| d.checked_add(u64::from(round_up)))
        .filter(|d| *d <= MAX_DROPS)
        .ok_or_else(|| LedgerError::InvalidAmount(format!("XRP value out of range: '{value}'")))?;
    Ok(drops)
}

/// Format drops as an XRP decimal string, trimming trailing zeros.
pub fn format_drops(drops: u64) -> String {
    if drops == 0 {
        return "0".to_string();
    }

    let whole = drops / DROPS_PER_XRP;
    let remainder = drops % DROPS_PER_XRP;

    if remainder == 0 {
        whole.to_string()
    } else {
        let decimal_str = format!("{remainder:06}");
        format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
    }
}

/// Encode a non-negative decimal string into the 64-bit issued value field.
fn encode_issued_value(value: &str) -> Result<u64, LedgerError> {
    validate_value(value)?;
    let (int, frac) = value.split_once('.').unwrap_or((value, ""));

    let mut digits = format!("{int}{frac}");
    let mut exponent = -(frac.len() as i32);

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(NOT_NATIVE_BIT);
    }
    digits = trimmed.to_string();
    while digits.ends_with('0') {
        digits.pop();
        exponent += 1;
    }
    if digits.len() > 16 {
        return Err(LedgerError::InvalidAmount(format!(
            "value has more than 16 significant digits: '{value}'"
        )));
    }

    let mut mantissa: u64 = digits
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(value.to_string()))?;
    while mantissa < MIN_MANTISSA {
        mantissa *= 10;
        exponent -= 1;
    }
    debug_assert!(mantissa <= MAX_MANTISSA);

    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return Err(LedgerError::InvalidAmount(format!(
            "value magnitude out of range: '{value}'"
        )));
    }

    let biased = (exponent + 97) as u64;
    Ok(NOT_NATIVE_BIT | POSITIVE_BIT | (biased << 54) | mantissa)
}
