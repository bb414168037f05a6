use rust_decimal::Decimal;
use tracing::warn;

use crate::core::money::{is_settled, ledger_amount, round2};
use crate::core::{AppError, Result};
use crate::modules::arrears::models::{Arrear, ArrearStatus};

/// What an admin asked for when updating an arrear
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementInput {
    /// Payment to apply; `None` and zero both mean "no payment"
    pub amount_paid: Option<Decimal>,
    pub requested_status: Option<ArrearStatus>,
    /// `Some("")` clears the notes, `None` keeps them
    pub notes: Option<String>,
}

/// Writes a settlement will perform
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    /// Payment row to record, only when a positive amount was paid
    pub payment_amount: Option<Decimal>,
    pub remaining: Decimal,
    pub final_status: ArrearStatus,
    pub notes: Option<String>,
}

impl SettlementPlan {
    pub fn records_payment(&self) -> bool {
        self.payment_amount.is_some()
    }
}

/// Decides the remaining amount and status of an arrear after a settlement
pub struct SettlementCalculator;

impl SettlementCalculator {
    /// Validates the input against the arrear and plans the update.
    ///
    /// # Business Rules
    /// - The payment must be storable as a ledger amount (two decimals at most)
    /// - A payment larger than the outstanding amount needs an explicit
    ///   `cleared` or `waived` status
    /// - `remaining = max(0, round2(original - paid))`
    /// - A positive payment that settles the arrear clears it, unless `waived`
    ///   was requested
    /// - A positive partial payment on an outstanding arrear makes it
    ///   `partially_paid`
    /// - Anything else keeps the requested status, or the current one
    pub fn plan(arrear: &Arrear, input: &SettlementInput) -> Result<SettlementPlan> {
        let original = arrear.amount;
        let paid = ledger_amount(input.amount_paid.unwrap_or(Decimal::ZERO))?;

        let explicitly_closed = input
            .requested_status
            .map(|s| s.closes_arrear())
            .unwrap_or(false);

        if paid > original && !explicitly_closed {
            warn!(
                arrear_id = %arrear.id,
                amount_paid = %paid,
                outstanding = %original,
                "Rejected overpayment without explicit status"
            );
            return Err(AppError::validation(format!(
                "Payment of {} exceeds the outstanding amount of {}; set status to cleared or waived to accept it",
                paid, original
            )));
        }

        let remaining = round2(original - paid).max(Decimal::ZERO);
        let base_status = input.requested_status.unwrap_or(arrear.status);
        let has_payment = paid > Decimal::ZERO;

        let final_status = if has_payment && is_settled(remaining) {
            if input.requested_status == Some(ArrearStatus::Waived) {
                ArrearStatus::Waived
            } else {
                ArrearStatus::Cleared
            }
        } else if has_payment
            && remaining > Decimal::ZERO
            && remaining < original
            && base_status == ArrearStatus::Outstanding
        {
            ArrearStatus::PartiallyPaid
        } else {
            base_status
        };

        let notes = match &input.notes {
            Some(notes) if notes.trim().is_empty() => None,
            Some(notes) => Some(notes.trim().to_string()),
            None => arrear.notes.clone(),
        };

        Ok(SettlementPlan {
            payment_amount: has_payment.then_some(paid),
            remaining,
            final_status,
            notes,
        })
    }

    /// Applies a plan to the arrear
    pub fn apply(arrear: &mut Arrear, plan: &SettlementPlan, now: chrono::DateTime<chrono::Utc>) {
        arrear.amount = plan.remaining;
        arrear.status = plan.final_status;
        arrear.notes = plan.notes.clone();
        arrear.updated_at = now;
    }
}
