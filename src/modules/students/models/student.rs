use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Enrolled student. `grade_level` changes on promotion, rows are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Student {
    /// School-issued id, unique within a school
    pub student_id_display: String,
    pub full_name: String,
    pub grade_level: String,
    pub school_id: Uuid,
}

impl Student {
    pub fn new(
        school_id: Uuid,
        student_id_display: impl Into<String>,
        full_name: impl Into<String>,
        grade_level: impl Into<String>,
    ) -> Self {
        Self {
            student_id_display: student_id_display.into(),
            full_name: full_name.into(),
            grade_level: grade_level.into(),
            school_id,
        }
    }
}
