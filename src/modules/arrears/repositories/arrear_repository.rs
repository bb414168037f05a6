// Postgres persistence for the student_arrears table
//
// Write paths that must be atomic take an open transaction:
// - replace the rows of a year transition (lock + delete + insert)
// - lock a row for settlement and update it

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::{AcademicYear, AppError, Result};
use crate::modules::arrears::models::{Arrear, ArrearFilter, ArrearStatus, StatusTotal};

const ARREAR_COLUMNS: &str = r#"
    id, school_id, student_id_display, student_name, grade_level_at_arrear,
    academic_year_from, academic_year_to, amount, status, notes,
    created_at, updated_at
"#;

fn transition_lock_key(
    school_id: Uuid,
    academic_year_from: AcademicYear,
    academic_year_to: AcademicYear,
) -> String {
    format!(
        "student_arrears:{}:{}:{}",
        school_id, academic_year_from, academic_year_to
    )
}

/// Repository for arrear rows
pub struct ArrearRepository {
    pool: PgPool,
}

impl ArrearRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an arrear of a school by ID
    pub async fn find_by_id(&self, school_id: Uuid, id: Uuid) -> Result<Option<Arrear>> {
        let row = sqlx::query_as::<_, ArrearRow>(&format!(
            "SELECT {} FROM student_arrears WHERE school_id = $1 AND id = $2",
            ARREAR_COLUMNS
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch arrear: {}", e)))?;

        row.map(Arrear::try_from).transpose()
    }

    /// Lock an arrear row for the rest of the transaction (`FOR UPDATE`)
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Arrear>> {
        let row = sqlx::query_as::<_, ArrearRow>(&format!(
            "SELECT {} FROM student_arrears WHERE school_id = $1 AND id = $2 FOR UPDATE",
            ARREAR_COLUMNS
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to lock arrear: {}", e)))?;

        row.map(Arrear::try_from).transpose()
    }

    /// List a school's arrears, ordered by student name
    pub async fn list(&self, school_id: Uuid, filter: &ArrearFilter) -> Result<Vec<Arrear>> {
        let rows = sqlx::query_as::<_, ArrearRow>(&format!(
            r#"
            SELECT {}
            FROM student_arrears
            WHERE school_id = $1
              AND ($2::text IS NULL OR academic_year_from = $2)
              AND ($3::text IS NULL OR academic_year_to = $3)
              AND ($4::text IS NULL OR status = $4)
              AND ($5::text IS NULL OR student_id_display = $5)
            ORDER BY student_name ASC, student_id_display ASC
            "#,
            ARREAR_COLUMNS
        ))
        .bind(school_id)
        .bind(filter.academic_year_from.map(|y| y.to_string()))
        .bind(filter.academic_year_to.map(|y| y.to_string()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.student_id_display.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list arrears: {}", e)))?;

        rows.into_iter().map(Arrear::try_from).collect()
    }

    /// Count and total per status for one year transition
    pub async fn totals_by_status(
        &self,
        school_id: Uuid,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
    ) -> Result<Vec<StatusTotal>> {
        let rows = sqlx::query_as::<_, StatusTotalRow>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total_amount
            FROM student_arrears
            WHERE school_id = $1 AND academic_year_from = $2 AND academic_year_to = $3
            GROUP BY status
            "#,
        )
        .bind(school_id)
        .bind(academic_year_from.to_string())
        .bind(academic_year_to.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to summarize arrears: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                Ok(StatusTotal {
                    status: row.status.parse().map_err(|_| {
                        AppError::Internal(format!("Invalid arrear status: {}", row.status))
                    })?,
                    count: row.count,
                    total_amount: row.total_amount,
                })
            })
            .collect()
    }

    /// Serialize writers of one year transition until the transaction ends.
    ///
    /// Takes a transaction-scoped advisory lock keyed on the school and the
    /// year pair, so it also covers transitions that have no rows yet.
    pub async fn lock_transition_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
    ) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(transition_lock_key(
                school_id,
                academic_year_from,
                academic_year_to,
            ))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to lock year transition: {}", e)))?;

        Ok(())
    }

    /// Rows of one year transition, locked for the rest of the transaction
    pub async fn find_for_years_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
    ) -> Result<Vec<Arrear>> {
        let rows = sqlx::query_as::<_, ArrearRow>(&format!(
            r#"
            SELECT {}
            FROM student_arrears
            WHERE school_id = $1 AND academic_year_from = $2 AND academic_year_to = $3
            FOR UPDATE
            "#,
            ARREAR_COLUMNS
        ))
        .bind(school_id)
        .bind(academic_year_from.to_string())
        .bind(academic_year_to.to_string())
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch arrears: {}", e)))?;

        rows.into_iter().map(Arrear::try_from).collect()
    }

    /// Delete every row of one year transition; returns the number removed
    pub async fn delete_for_years_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        academic_year_from: AcademicYear,
        academic_year_to: AcademicYear,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM student_arrears
            WHERE school_id = $1 AND academic_year_from = $2 AND academic_year_to = $3
            "#,
        )
        .bind(school_id)
        .bind(academic_year_from.to_string())
        .bind(academic_year_to.to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to delete arrears: {}", e)))?;

        Ok(result.rows_affected())
    }

    /// Insert a batch of arrears within an existing transaction
    pub async fn insert_batch_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        arrears: &[Arrear],
    ) -> Result<()> {
        for arrear in arrears {
            sqlx::query(
                r#"
                INSERT INTO student_arrears (
                    id, school_id, student_id_display, student_name,
                    grade_level_at_arrear, academic_year_from, academic_year_to,
                    amount, status, notes, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(arrear.id)
            .bind(arrear.school_id)
            .bind(&arrear.student_id_display)
            .bind(&arrear.student_name)
            .bind(&arrear.grade_level_at_arrear)
            .bind(arrear.academic_year_from.to_string())
            .bind(arrear.academic_year_to.to_string())
            .bind(arrear.amount)
            .bind(arrear.status.as_str())
            .bind(&arrear.notes)
            .bind(arrear.created_at)
            .bind(arrear.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to insert arrear: {}", e)))?;
        }

        Ok(())
    }

    /// Persist amount, status and notes of a settled arrear
    pub async fn update_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        arrear: &Arrear,
    ) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE student_arrears
            SET amount = $1, status = $2, notes = $3, updated_at = $4
            WHERE school_id = $5 AND id = $6
            "#,
        )
        .bind(arrear.amount)
        .bind(arrear.status.as_str())
        .bind(&arrear.notes)
        .bind(arrear.updated_at)
        .bind(arrear.school_id)
        .bind(arrear.id)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update arrear: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Arrear not found"));
        }

        Ok(())
    }

    /// Admin delete of a single arrear
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<()> {
        let rows_affected = sqlx::query(
            "DELETE FROM student_arrears WHERE school_id = $1 AND id = $2",
        )
        .bind(school_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to delete arrear: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!("Arrear '{}' not found", id)));
        }

        Ok(())
    }
}

/// Database row representation for student_arrears table
#[derive(sqlx::FromRow)]
struct ArrearRow {
    id: Uuid,
    school_id: Uuid,
    student_id_display: String,
    student_name: String,
    grade_level_at_arrear: String,
    academic_year_from: String,
    academic_year_to: String,
    amount: Decimal,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ArrearRow> for Arrear {
    type Error = AppError;

    fn try_from(row: ArrearRow) -> Result<Self> {
        let corrupt = |field: &str, value: &str| {
            AppError::Internal(format!("Arrear {} has invalid {}: {}", row.id, field, value))
        };

        let status: ArrearStatus = row
            .status
            .parse()
            .map_err(|_| corrupt("status", &row.status))?;
        let academic_year_from = AcademicYear::parse(&row.academic_year_from)
            .map_err(|_| corrupt("academic_year_from", &row.academic_year_from))?;
        let academic_year_to = AcademicYear::parse(&row.academic_year_to)
            .map_err(|_| corrupt("academic_year_to", &row.academic_year_to))?;

        Ok(Arrear {
            id: row.id,
            school_id: row.school_id,
            student_id_display: row.student_id_display,
            student_name: row.student_name,
            grade_level_at_arrear: row.grade_level_at_arrear,
            academic_year_from,
            academic_year_to,
            amount: row.amount,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatusTotalRow {
    status: String,
    count: i64,
    total_amount: Decimal,
}
