use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{AppError, Result};

/// A school year written as `YYYY-YYYY`, e.g. `2024-2025`.
///
/// The school year runs September to August. Payments are attributed to a
/// year when they fall between August 1 of the start year and July 31 of the
/// end year, both inclusive, so early payments made in August still count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: i32,
    end: i32,
}

impl AcademicYear {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if !(1000..=9999).contains(&start) || !(1000..=9999).contains(&end) {
            return Err(AppError::validation(format!(
                "Academic year bounds must be four-digit years, got {}-{}",
                start, end
            )));
        }

        if end != start + 1 {
            return Err(AppError::validation(format!(
                "Academic year must span consecutive years, got {}-{}",
                start, end
            )));
        }

        Ok(Self { start, end })
    }

    /// Strictly parses `^\d{4}-\d{4}$`
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || {
            AppError::validation(format!(
                "Invalid academic year '{}': expected format YYYY-YYYY",
                raw
            ))
        };

        let bytes = raw.as_bytes();
        if bytes.len() != 9 || bytes[4] != b'-' {
            return Err(invalid());
        }

        let (start, end) = (&raw[..4], &raw[5..]);
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(start) || !all_digits(end) {
            return Err(invalid());
        }

        let start: i32 = start.parse().map_err(|_| invalid())?;
        let end: i32 = end.parse().map_err(|_| invalid())?;

        Self::new(start, end)
    }

    pub fn start_year(&self) -> i32 {
        self.start
    }

    pub fn end_year(&self) -> i32 {
        self.end
    }

    /// The following year: both bounds move forward by one
    pub fn next(&self) -> Result<Self> {
        Self::new(self.start + 1, self.end + 1)
    }

    /// Inclusive date range used to attribute payments to this year
    pub fn payment_window(&self) -> Result<(NaiveDate, NaiveDate)> {
        let from = NaiveDate::from_ymd_opt(self.start, 8, 1);
        let to = NaiveDate::from_ymd_opt(self.end, 7, 31);

        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(AppError::internal(format!(
                "Cannot build payment window for {}",
                self
            ))),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.payment_window() {
            Ok((from, to)) => date >= from && date <= to,
            Err(_) => false,
        }
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", self.start, self.end)
    }
}

impl FromStr for AcademicYear {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.to_string()
    }
}
