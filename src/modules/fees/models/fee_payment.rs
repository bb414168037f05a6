use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// A recorded fee payment. Append-only: rows are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeePayment {
    pub id: Uuid,
    /// Printed on receipts, e.g. `AR-1718000000000-3f9a61c2`
    pub payment_id_display: String,
    pub school_id: Uuid,
    pub student_id_display: String,
    pub student_name: Option<String>,
    pub grade_level: Option<String>,
    pub amount_paid: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub term_paid_for: String,
    pub notes: Option<String>,
    pub received_by: Option<String>,
    /// Set when the payment settled an arrear
    pub arrear_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FeePayment {
    pub fn new(
        payment_id_display: String,
        school_id: Uuid,
        student_id_display: String,
        amount_paid: Decimal,
        payment_date: NaiveDate,
        payment_method: String,
        term_paid_for: String,
    ) -> Result<Self> {
        if amount_paid <= Decimal::ZERO {
            return Err(AppError::validation("Amount paid must be positive"));
        }

        if payment_method.trim().is_empty() {
            return Err(AppError::validation("Payment method cannot be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            payment_id_display,
            school_id,
            student_id_display,
            student_name: None,
            grade_level: None,
            amount_paid,
            payment_date,
            payment_method,
            term_paid_for,
            notes: None,
            received_by: None,
            arrear_id: None,
            created_at: Utc::now(),
        })
    }
}

/// Display id for a payment: `<prefix>-<unix millis>-<8 hex chars>`.
///
/// The random suffix keeps ids distinct for payments recorded in the same
/// millisecond.
pub fn generate_payment_display_id(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, at.timestamp_millis(), &suffix[..8])
}
