use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::{AcademicYear, Result};
use crate::modules::arrears::models::Arrear;
use crate::modules::arrears::services::balance_calculator::StudentBalance;

/// Builds the arrear rows that replace a year transition's ledger
pub struct LedgerWriter;

impl LedgerWriter {
    /// One `outstanding` row per candidate.
    ///
    /// With `preserve_annotations`, a candidate whose previous row for the same
    /// transition had the same amount keeps that row's status and notes.
    /// `existing` is ignored otherwise.
    pub fn build_rows(
        school_id: Uuid,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
        candidates: &[StudentBalance],
        existing: &[Arrear],
        preserve_annotations: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Arrear>> {
        let previous: HashMap<&str, &Arrear> = if preserve_annotations {
            existing
                .iter()
                .filter(|a| {
                    a.academic_year_from == academic_year_from
                        && a.academic_year_to == academic_year_to
                })
                .map(|a| (a.student_id_display.as_str(), a))
                .collect()
        } else {
            HashMap::new()
        };

        candidates
            .iter()
            .map(|candidate| {
                let mut row = Arrear::outstanding(
                    school_id,
                    candidate.student_id_display.clone(),
                    candidate.student_name.clone(),
                    candidate.grade_level.clone(),
                    academic_year_from,
                    academic_year_to,
                    candidate.balance,
                    now,
                )?;

                if let Some(prev) = previous.get(candidate.student_id_display.as_str()) {
                    if prev.amount == candidate.balance {
                        row.status = prev.status;
                        row.notes = prev.notes.clone();
                    }
                }

                Ok(row)
            })
            .collect()
    }
}

/// Outcome of recalculating one year transition
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecalculationSummary {
    pub academic_year_from: AcademicYear,
    pub academic_year_to: AcademicYear,
    pub students_examined: usize,
    pub arrears_created: usize,
    /// Rows removed from the previous run
    pub arrears_replaced: u64,
    pub total_amount: rust_decimal::Decimal,
    /// Students whose payments exceeded their fees; no credit is recorded
    pub overpaid_students: Vec<StudentBalance>,
    pub message: String,
}

impl RecalculationSummary {
    pub fn message_for(arrears_created: usize, academic_year_from: AcademicYear) -> String {
        if arrears_created == 0 {
            format!("No arrears found for {}", academic_year_from)
        } else {
            format!(
                "{} arrears recorded for {}",
                arrears_created, academic_year_from
            )
        }
    }
}
