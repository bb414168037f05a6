use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AcademicYear, AppError, Result};

/// Carried-forward unpaid balance of one student for one year transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrear {
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id_display: String,
    /// Snapshot taken at calculation time
    pub student_name: String,
    /// Snapshot taken at calculation time; the student may since be promoted
    pub grade_level_at_arrear: String,
    pub academic_year_from: AcademicYear,
    pub academic_year_to: AcademicYear,
    /// Current outstanding amount, never negative
    pub amount: Decimal,
    pub status: ArrearStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Arrear {
    /// A fresh `outstanding` arrear as written by a recalculation run
    pub fn outstanding(
        school_id: Uuid,
        student_id_display: String,
        student_name: String,
        grade_level_at_arrear: String,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(AppError::validation("Arrear amount cannot be negative"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            school_id,
            student_id_display,
            student_name,
            grade_level_at_arrear,
            academic_year_from,
            academic_year_to,
            amount,
            status: ArrearStatus::Outstanding,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Arrear lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrearStatus {
    Outstanding,
    PartiallyPaid,
    Cleared,
    /// Forgiven by an admin
    Waived,
}

impl ArrearStatus {
    pub const ALL: [ArrearStatus; 4] = [
        ArrearStatus::Outstanding,
        ArrearStatus::PartiallyPaid,
        ArrearStatus::Cleared,
        ArrearStatus::Waived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outstanding => "outstanding",
            Self::PartiallyPaid => "partially_paid",
            Self::Cleared => "cleared",
            Self::Waived => "waived",
        }
    }

    /// Still owes money
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Outstanding | Self::PartiallyPaid)
    }

    /// Statuses that let a settlement exceed the outstanding amount
    pub fn closes_arrear(&self) -> bool {
        matches!(self, Self::Cleared | Self::Waived)
    }
}

impl std::fmt::Display for ArrearStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ArrearStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "outstanding" => Ok(Self::Outstanding),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "cleared" => Ok(Self::Cleared),
            "waived" => Ok(Self::Waived),
            _ => Err(AppError::validation(format!("Invalid arrear status: {}", s))),
        }
    }
}

/// Filters for listing a school's arrears; `None` means "any"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrearFilter {
    pub academic_year_from: Option<AcademicYear>,
    pub academic_year_to: Option<AcademicYear>,
    pub status: Option<ArrearStatus>,
    pub student_id_display: Option<String>,
}

/// Count and total of arrears in one status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTotal {
    pub status: ArrearStatus,
    pub count: i64,
    pub total_amount: Decimal,
}

/// Per-status totals for one year transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub academic_year_from: AcademicYear,
    pub academic_year_to: AcademicYear,
    /// One entry per status, zero-filled
    pub by_status: Vec<StatusTotal>,
    /// Sum over outstanding and partially paid arrears
    pub total_open_amount: Decimal,
}

impl LedgerSummary {
    pub fn from_totals(
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
        totals: Vec<StatusTotal>,
    ) -> Self {
        let by_status: Vec<StatusTotal> = ArrearStatus::ALL
            .iter()
            .map(|status| {
                totals
                    .iter()
                    .find(|t| t.status == *status)
                    .cloned()
                    .unwrap_or(StatusTotal {
                        status: *status,
                        count: 0,
                        total_amount: Decimal::ZERO,
                    })
            })
            .collect();

        let total_open_amount = by_status
            .iter()
            .filter(|t| t.status.is_open())
            .map(|t| t.total_amount)
            .sum();

        Self {
            academic_year_from,
            academic_year_to,
            by_status,
            total_open_amount,
        }
    }
}
