use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::{AcademicYear, AppError, Result};
use crate::modules::fees::models::{FeeItem, FeePayment};

/// Repository for fee items and the payment ledger
pub struct FeeRepository {
    pool: PgPool,
}

impl FeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fee items of a school for one academic year
    pub async fn list_fee_items(
        &self,
        school_id: Uuid,
        academic_year: AcademicYear,
    ) -> Result<Vec<FeeItem>> {
        let rows = sqlx::query_as::<_, FeeItemRow>(
            r#"
            SELECT id, school_id, grade_level, academic_year, description, amount
            FROM school_fee_items
            WHERE school_id = $1 AND academic_year = $2
            "#,
        )
        .bind(school_id)
        .bind(academic_year.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch fee items: {}", e)))?;

        rows.into_iter().map(FeeItem::try_from).collect()
    }

    /// Payments of a school dated within `[from, to]`, both inclusive
    pub async fn list_payments_between(
        &self,
        school_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FeePayment>> {
        sqlx::query_as::<_, FeePayment>(
            r#"
            SELECT
                id, payment_id_display, school_id, student_id_display,
                student_name, grade_level, amount_paid, payment_date,
                payment_method, term_paid_for, notes, received_by,
                arrear_id, created_at
            FROM fee_payments
            WHERE school_id = $1 AND payment_date BETWEEN $2 AND $3
            ORDER BY payment_date ASC
            "#,
        )
        .bind(school_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payments: {}", e)))
    }

    /// Find a payment by the id printed on its receipt
    pub async fn find_payment_by_display_id(
        &self,
        school_id: Uuid,
        payment_id_display: &str,
    ) -> Result<Option<FeePayment>> {
        sqlx::query_as::<_, FeePayment>(
            r#"
            SELECT
                id, payment_id_display, school_id, student_id_display,
                student_name, grade_level, amount_paid, payment_date,
                payment_method, term_paid_for, notes, received_by,
                arrear_id, created_at
            FROM fee_payments
            WHERE school_id = $1 AND payment_id_display = $2
            "#,
        )
        .bind(school_id)
        .bind(payment_id_display)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payment: {}", e)))
    }

    /// Insert a payment within an existing database transaction
    pub async fn insert_payment_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        payment: &FeePayment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fee_payments (
                id, payment_id_display, school_id, student_id_display,
                student_name, grade_level, amount_paid, payment_date,
                payment_method, term_paid_for, notes, received_by,
                arrear_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(payment.id)
        .bind(&payment.payment_id_display)
        .bind(payment.school_id)
        .bind(&payment.student_id_display)
        .bind(&payment.student_name)
        .bind(&payment.grade_level)
        .bind(payment.amount_paid)
        .bind(payment.payment_date)
        .bind(&payment.payment_method)
        .bind(&payment.term_paid_for)
        .bind(&payment.notes)
        .bind(&payment.received_by)
        .bind(payment.arrear_id)
        .bind(payment.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(format!(
                "Payment id '{}' is already taken; retry the settlement",
                payment.payment_id_display
            )),
            _ => AppError::Internal(format!("Failed to insert payment: {}", e)),
        })?;

        Ok(())
    }
}

/// Database row representation for school_fee_items table
#[derive(sqlx::FromRow)]
struct FeeItemRow {
    id: Uuid,
    school_id: Uuid,
    grade_level: String,
    academic_year: String,
    description: Option<String>,
    amount: Decimal,
}

impl TryFrom<FeeItemRow> for FeeItem {
    type Error = AppError;

    fn try_from(row: FeeItemRow) -> Result<Self> {
        let academic_year = AcademicYear::parse(&row.academic_year).map_err(|_| {
            AppError::Internal(format!(
                "Fee item {} has invalid academic year: {}",
                row.id, row.academic_year
            ))
        })?;

        Ok(FeeItem {
            id: row.id,
            school_id: row.school_id,
            grade_level: row.grade_level,
            academic_year,
            description: row.description,
            amount: row.amount,
        })
    }
}
