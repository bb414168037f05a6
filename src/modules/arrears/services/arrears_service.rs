// Business logic layer for the arrears ledger
//
// Implements:
// - Recalculation of a year transition (balance calculation + ledger replace)
// - Settlement of a single arrear with receipt
// - Queries, per-status summary, admin delete and receipt re-print

use chrono::{DateTime, DurationRound, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ArrearsConfig;
use crate::core::{AcademicYear, AppError, Result, SchoolContext};
use crate::modules::arrears::{
    models::{Arrear, ArrearFilter, LedgerSummary, Receipt},
    repositories::ArrearRepository,
    services::{
        BalanceCalculator, LedgerWriter, RecalculationSummary, SettlementCalculator,
        SettlementInput,
    },
};
use crate::modules::fees::models::{generate_payment_display_id, FeePayment};
use crate::modules::fees::repositories::FeeRepository;
use crate::modules::schools::repositories::SchoolRepository;
use crate::modules::students::repositories::StudentRepository;

/// Current time at the microsecond precision Postgres stores, so timestamps
/// returned to callers compare equal to the persisted ones
fn stored_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

/// Request to recompute the arrears of `academic_year` into the following year
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculateArrears {
    pub academic_year: AcademicYear,
    pub preserve_annotations: bool,
}

/// Request to apply a payment and/or status change to one arrear
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettleArrear {
    pub input: SettlementInput,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    /// Reject the update when the row changed since this timestamp was read
    pub expected_updated_at: Option<DateTime<Utc>>,
}

/// Updated arrear plus the receipt of the payment, if one was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub arrear: Arrear,
    pub receipt: Option<Receipt>,
}

/// Service for arrears ledger operations
pub struct ArrearsService {
    pool: PgPool,
    arrears: ArrearRepository,
    fees: FeeRepository,
    students: StudentRepository,
    schools: SchoolRepository,
    config: ArrearsConfig,
}

impl ArrearsService {
    pub fn new(pool: PgPool, config: ArrearsConfig) -> Self {
        Self {
            arrears: ArrearRepository::new(pool.clone()),
            fees: FeeRepository::new(pool.clone()),
            students: StudentRepository::new(pool.clone()),
            schools: SchoolRepository::new(pool.clone()),
            pool,
            config,
        }
    }

    /// Recompute and replace the arrears for `academic_year -> academic_year.next()`
    ///
    /// # Business Rules
    /// - Balance = Σ fee items of the student's grade − Σ payments in the year window
    /// - Only positive balances become arrears; overpayments are reported, not credited
    /// - Previous rows of the transition are deleted and the new ones inserted in
    ///   one transaction
    pub async fn recalculate(
        &self,
        ctx: &SchoolContext,
        request: RecalculateArrears,
    ) -> Result<RecalculationSummary> {
        let academic_year_from = request.academic_year;
        let academic_year_to = academic_year_from.next()?;

        info!(
            school_id = %ctx.school_id,
            academic_year_from = %academic_year_from,
            academic_year_to = %academic_year_to,
            requested_by = ctx.acting_user.as_str(),
            "Recalculating arrears"
        );

        self.schools.get(ctx.school_id).await?;

        let students = self.students.list_by_school(ctx.school_id).await?;
        let fee_items = self
            .fees
            .list_fee_items(ctx.school_id, academic_year_from)
            .await?;
        let (window_start, window_end) = academic_year_from.payment_window()?;
        let payments = self
            .fees
            .list_payments_between(ctx.school_id, window_start, window_end)
            .await?;

        let report =
            BalanceCalculator::calculate(academic_year_from, &students, &fee_items, &payments);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        ArrearRepository::lock_transition_with_tx(
            &mut tx,
            ctx.school_id,
            academic_year_from,
            academic_year_to,
        )
        .await?;

        let existing = if request.preserve_annotations {
            ArrearRepository::find_for_years_with_tx(
                &mut tx,
                ctx.school_id,
                academic_year_from,
                academic_year_to,
            )
            .await?
        } else {
            Vec::new()
        };

        let rows = LedgerWriter::build_rows(
            ctx.school_id,
            academic_year_from,
            academic_year_to,
            &report.candidates,
            &existing,
            request.preserve_annotations,
            stored_now(),
        )?;

        let arrears_replaced = ArrearRepository::delete_for_years_with_tx(
            &mut tx,
            ctx.school_id,
            academic_year_from,
            academic_year_to,
        )
        .await?;

        if !rows.is_empty() {
            ArrearRepository::insert_batch_with_tx(&mut tx, &rows).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        if !report.overpaid.is_empty() {
            warn!(
                school_id = %ctx.school_id,
                academic_year = %academic_year_from,
                overpaid_students = report.overpaid.len(),
                "Overpayments found; no credit is carried forward"
            );
        }

        let summary = RecalculationSummary {
            academic_year_from,
            academic_year_to,
            students_examined: report.students_examined,
            arrears_created: rows.len(),
            arrears_replaced,
            total_amount: report.total_arrears(),
            message: RecalculationSummary::message_for(rows.len(), academic_year_from),
            overpaid_students: report.overpaid,
        };

        info!(
            school_id = %ctx.school_id,
            academic_year_from = %academic_year_from,
            arrears_created = summary.arrears_created,
            arrears_replaced = summary.arrears_replaced,
            total_amount = %summary.total_amount,
            "Arrears recalculated"
        );

        Ok(summary)
    }

    /// Apply a payment and/or status change to one arrear
    ///
    /// # Business Rules
    /// - Validation failures write nothing
    /// - The arrear row is locked (`FOR UPDATE`) for the duration of the update
    /// - The payment insert and the arrear update commit together
    pub async fn settle(
        &self,
        ctx: &SchoolContext,
        arrear_id: Uuid,
        request: SettleArrear,
    ) -> Result<SettlementOutcome> {
        let school = self.schools.get(ctx.school_id).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        let mut arrear = ArrearRepository::find_by_id_for_update(&mut tx, ctx.school_id, arrear_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Arrear '{}' not found", arrear_id)))?;

        if let Some(expected) = request.expected_updated_at {
            if arrear.updated_at != expected {
                warn!(
                    arrear_id = %arrear_id,
                    expected = %expected,
                    actual = %arrear.updated_at,
                    "Arrear changed since it was read"
                );
                return Err(AppError::conflict(format!(
                    "Arrear '{}' was modified at {}; reload and retry",
                    arrear_id, arrear.updated_at
                )));
            }
        }

        let plan = SettlementCalculator::plan(&arrear, &request.input)?;
        let now = stored_now();

        let payment = match plan.payment_amount {
            Some(amount) => {
                let payment = self.build_payment(ctx, &arrear, amount, &request, now)?;
                FeeRepository::insert_payment_with_tx(&mut tx, &payment).await?;
                Some(payment)
            }
            None => None,
        };

        SettlementCalculator::apply(&mut arrear, &plan, now);
        ArrearRepository::update_with_tx(&mut tx, &arrear).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        info!(
            school_id = %ctx.school_id,
            arrear_id = %arrear_id,
            amount_paid = %plan.payment_amount.unwrap_or(Decimal::ZERO),
            remaining = %arrear.amount,
            status = %arrear.status,
            "Arrear settled"
        );

        let receipt = payment.as_ref().map(|p| Receipt::new(p, &school));

        Ok(SettlementOutcome { arrear, receipt })
    }

    fn build_payment(
        &self,
        ctx: &SchoolContext,
        arrear: &Arrear,
        amount: Decimal,
        request: &SettleArrear,
        now: DateTime<Utc>,
    ) -> Result<FeePayment> {
        let payment_method = request
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.default_payment_method)
            .to_string();

        let mut payment = FeePayment::new(
            generate_payment_display_id(&self.config.receipt_prefix, now),
            ctx.school_id,
            arrear.student_id_display.clone(),
            amount,
            request.payment_date.unwrap_or_else(|| now.date_naive()),
            payment_method,
            self.config.term_label.clone(),
        )?;

        payment.student_name = Some(arrear.student_name.clone());
        payment.grade_level = Some(arrear.grade_level_at_arrear.clone());
        payment.notes = request
            .input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        payment.received_by = Some(ctx.acting_user.clone());
        payment.arrear_id = Some(arrear.id);
        payment.created_at = now;

        Ok(payment)
    }

    pub async fn get_arrear(&self, ctx: &SchoolContext, arrear_id: Uuid) -> Result<Arrear> {
        self.arrears
            .find_by_id(ctx.school_id, arrear_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Arrear '{}' not found", arrear_id)))
    }

    pub async fn list_arrears(
        &self,
        ctx: &SchoolContext,
        filter: &ArrearFilter,
    ) -> Result<Vec<Arrear>> {
        self.arrears.list(ctx.school_id, filter).await
    }

    /// Per-status totals for `academic_year_from -> academic_year_from.next()`
    pub async fn summary(
        &self,
        ctx: &SchoolContext,
        academic_year_from: AcademicYear,
    ) -> Result<LedgerSummary> {
        let academic_year_to = academic_year_from.next()?;
        let totals = self
            .arrears
            .totals_by_status(ctx.school_id, academic_year_from, academic_year_to)
            .await?;

        Ok(LedgerSummary::from_totals(
            academic_year_from,
            academic_year_to,
            totals,
        ))
    }

    pub async fn delete_arrear(&self, ctx: &SchoolContext, arrear_id: Uuid) -> Result<()> {
        self.arrears.delete(ctx.school_id, arrear_id).await?;

        info!(
            school_id = %ctx.school_id,
            arrear_id = %arrear_id,
            deleted_by = ctx.acting_user.as_str(),
            "Arrear deleted"
        );

        Ok(())
    }

    /// Rebuild the receipt of an earlier arrears payment
    pub async fn receipt(&self, ctx: &SchoolContext, payment_id_display: &str) -> Result<Receipt> {
        let school = self.schools.get(ctx.school_id).await?;
        let payment = self
            .fees
            .find_payment_by_display_id(ctx.school_id, payment_id_display)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payment '{}' not found", payment_id_display))
            })?;

        Ok(Receipt::new(&payment, &school))
    }
}
