use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AcademicYear, AppError, Result};

/// One line of a school's fee schedule (tuition, books, ...) for a grade and year.
/// Several items may apply to the same grade; what a student owes is their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeItem {
    pub id: Uuid,
    pub school_id: Uuid,
    pub grade_level: String,
    pub academic_year: AcademicYear,
    pub description: Option<String>,
    pub amount: Decimal,
}

impl FeeItem {
    pub fn new(
        school_id: Uuid,
        grade_level: impl Into<String>,
        academic_year: AcademicYear,
        amount: Decimal,
    ) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(AppError::validation("Fee amount cannot be negative"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            school_id,
            grade_level: grade_level.into(),
            academic_year,
            description: None,
            amount,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
