use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::money::format_amount;
use crate::modules::fees::models::FeePayment;
use crate::modules::schools::models::School;

/// Printable receipt for a payment recorded against an arrear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub payment_id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub grade_level: Option<String>,
    /// Two-decimal string, e.g. `"400.00"`
    pub amount_paid: String,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub term_paid_for: String,
    pub notes: Option<String>,
    pub school_name: String,
    pub school_location: Option<String>,
    pub school_logo_url: Option<String>,
    pub received_by: Option<String>,
}

impl Receipt {
    pub fn new(payment: &FeePayment, school: &School) -> Self {
        Self {
            payment_id: payment.payment_id_display.clone(),
            student_id: payment.student_id_display.clone(),
            student_name: payment.student_name.clone(),
            grade_level: payment.grade_level.clone(),
            amount_paid: format_amount(payment.amount_paid),
            payment_date: payment.payment_date,
            payment_method: payment.payment_method.clone(),
            term_paid_for: payment.term_paid_for.clone(),
            notes: payment.notes.clone(),
            school_name: school.name.clone(),
            school_location: school.location.clone(),
            school_logo_url: school.logo_url.clone(),
            received_by: payment.received_by.clone(),
        }
    }
}
