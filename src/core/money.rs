use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;

use crate::core::{AppError, Result};

/// Decimal places kept on every ledger amount
pub const LEDGER_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12,2)` ledger column holds
pub const MAX_LEDGER_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Remaining balances at or below this are treated as settled
pub const SETTLEMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Rounds to two decimal places, half away from zero
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when a remaining balance is within the settlement tolerance
pub fn is_settled(remaining: Decimal) -> bool {
    remaining <= SETTLEMENT_TOLERANCE
}

/// Checks that an amount can be stored as-is in a ledger column.
///
/// Negative amounts, amounts with more than [`LEDGER_SCALE`] significant
/// decimals and amounts above [`MAX_LEDGER_AMOUNT`] are validation errors.
/// Trailing zeros are dropped, so `"100.500"` is accepted as `100.50`.
pub fn ledger_amount(amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::validation(format!(
            "Amount must be non-negative, got {}",
            amount
        )));
    }

    let normalized = amount.normalize();
    if normalized.scale() > LEDGER_SCALE {
        return Err(AppError::validation(format!(
            "Amount {} has more than {} decimal places",
            amount, LEDGER_SCALE
        )));
    }

    if normalized > MAX_LEDGER_AMOUNT {
        return Err(AppError::validation(format!(
            "Amount {} exceeds the maximum of {}",
            amount, MAX_LEDGER_AMOUNT
        )));
    }

    Ok(normalized)
}

/// Parses an amount entered by an admin.
///
/// Accepts plain (`"400.00"`) and scientific (`"4e2"`) notation. Anything that
/// is not a finite, non-negative number storable by [`ledger_amount`] is a
/// validation error.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Amount cannot be empty"));
    }

    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AppError::validation(format!("Invalid amount: {}", trimmed)))?;

    ledger_amount(amount)
}

/// Amount as it arrives in a JSON body: either `"400.00"` or `400.0`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<serde_json::Value> for AmountInput {
    type Error = String;

    fn try_from(value: serde_json::Value) -> std::result::Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(raw) => Ok(AmountInput::Text(raw)),
            serde_json::Value::Number(number) => Ok(AmountInput::Number(number)),
            other => Err(format!("Amount must be a string or number, got {}", other)),
        }
    }
}

impl AmountInput {
    pub fn to_decimal(&self) -> Result<Decimal> {
        match self {
            AmountInput::Text(raw) => parse_amount(raw),
            AmountInput::Number(number) => parse_amount(&number.to_string()),
        }
    }
}

/// Formats an amount with exactly two decimals
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round2(amount))
}
