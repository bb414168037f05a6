use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::AcademicYear;
use crate::modules::fees::models::{FeeItem, FeePayment};
use crate::modules::students::models::Student;

/// What one student owed, paid and still owes for an academic year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentBalance {
    pub student_id_display: String,
    pub student_name: String,
    pub grade_level: String,
    pub due: Decimal,
    pub paid: Decimal,
    /// `due - paid`; negative when the student overpaid
    pub balance: Decimal,
}

/// Result of computing one school's balances for a year
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub academic_year: AcademicYear,
    pub students_examined: usize,
    /// Students with `balance > 0`, in student order
    pub candidates: Vec<StudentBalance>,
    /// Students with `balance < 0`. Reported only, never carried as credit.
    pub overpaid: Vec<StudentBalance>,
}

impl BalanceReport {
    pub fn total_arrears(&self) -> Decimal {
        self.candidates.iter().map(|c| c.balance).sum()
    }
}

/// Computes outstanding balances from students, fee items and payments
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// `grade_level -> Σ amount` over the fee items of `academic_year`
    pub fn fees_by_grade(
        fee_items: &[FeeItem],
        academic_year: AcademicYear,
    ) -> HashMap<String, Decimal> {
        let mut fees: HashMap<String, Decimal> = HashMap::new();
        for item in fee_items.iter().filter(|i| i.academic_year == academic_year) {
            *fees.entry(item.grade_level.clone()).or_default() += item.amount;
        }
        fees
    }

    /// `student_id_display -> Σ amount_paid` over payments inside the year's window
    pub fn payments_by_student(
        payments: &[FeePayment],
        academic_year: AcademicYear,
    ) -> HashMap<String, Decimal> {
        let mut paid: HashMap<String, Decimal> = HashMap::new();
        for payment in payments
            .iter()
            .filter(|p| academic_year.contains(p.payment_date))
        {
            *paid.entry(payment.student_id_display.clone()).or_default() += payment.amount_paid;
        }
        paid
    }

    /// Balance of every student, zero and negative balances included
    pub fn balances(
        academic_year: AcademicYear,
        students: &[Student],
        fee_items: &[FeeItem],
        payments: &[FeePayment],
    ) -> Vec<StudentBalance> {
        let fees = Self::fees_by_grade(fee_items, academic_year);
        let paid = Self::payments_by_student(payments, academic_year);

        students
            .iter()
            .map(|student| {
                let due = fees
                    .get(&student.grade_level)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let paid = paid
                    .get(&student.student_id_display)
                    .copied()
                    .unwrap_or(Decimal::ZERO);

                StudentBalance {
                    student_id_display: student.student_id_display.clone(),
                    student_name: student.full_name.clone(),
                    grade_level: student.grade_level.clone(),
                    due,
                    paid,
                    balance: due - paid,
                }
            })
            .collect()
    }

    /// Splits balances into arrear candidates (`balance > 0`) and overpayments
    pub fn calculate(
        academic_year: AcademicYear,
        students: &[Student],
        fee_items: &[FeeItem],
        payments: &[FeePayment],
    ) -> BalanceReport {
        let balances = Self::balances(academic_year, students, fee_items, payments);
        let students_examined = balances.len();

        let (candidates, rest): (Vec<_>, Vec<_>) = balances
            .into_iter()
            .partition(|b| b.balance > Decimal::ZERO);
        let overpaid: Vec<_> = rest
            .into_iter()
            .filter(|b| b.balance < Decimal::ZERO)
            .collect();

        debug!(
            academic_year = %academic_year,
            students_examined,
            candidates = candidates.len(),
            overpaid = overpaid.len(),
            "Balances calculated"
        );

        BalanceReport {
            academic_year,
            students_examined,
            candidates,
            overpaid,
        }
    }
}
