// HTTP handlers for the arrears ledger
//
// Endpoints (all require the tenant headers):
// - POST   /api/v1/arrears/recalculate            - Recompute a year transition
// - GET    /api/v1/arrears                        - List arrears
// - GET    /api/v1/arrears/summary                - Per-status totals
// - GET    /api/v1/arrears/receipts/{payment_id}  - Re-print a receipt
// - GET    /api/v1/arrears/{id}                   - One arrear
// - PATCH  /api/v1/arrears/{id}                   - Settle / update an arrear
// - DELETE /api/v1/arrears/{id}                   - Admin delete

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ArrearsConfig;
use crate::core::money::{format_amount, AmountInput};
use crate::core::{AcademicYear, Result, SchoolContext};
use crate::modules::arrears::{
    models::{Arrear, ArrearFilter, ArrearStatus, LedgerSummary, Receipt},
    services::{
        ArrearsService, RecalculateArrears, RecalculationSummary, SettleArrear,
        SettlementInput, StudentBalance,
    },
};

/// Arrear as returned over HTTP; amounts are two-decimal strings
#[derive(Debug, Serialize, Deserialize)]
pub struct ArrearResponse {
    pub id: Uuid,
    pub student_id_display: String,
    pub student_name: String,
    pub grade_level_at_arrear: String,
    pub academic_year_from: String,
    pub academic_year_to: String,
    pub amount: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Arrear> for ArrearResponse {
    fn from(arrear: Arrear) -> Self {
        Self {
            id: arrear.id,
            student_id_display: arrear.student_id_display,
            student_name: arrear.student_name,
            grade_level_at_arrear: arrear.grade_level_at_arrear,
            academic_year_from: arrear.academic_year_from.to_string(),
            academic_year_to: arrear.academic_year_to.to_string(),
            amount: format_amount(arrear.amount),
            status: arrear.status.to_string(),
            notes: arrear.notes,
            created_at: arrear.created_at,
            updated_at: arrear.updated_at,
        }
    }
}

/// Request for POST /api/v1/arrears/recalculate
#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    /// Year whose unpaid balances are carried forward, e.g. `"2024-2025"`
    pub academic_year: String,
    #[serde(default)]
    pub preserve_annotations: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverpaidStudentResponse {
    pub student_id_display: String,
    pub student_name: String,
    pub grade_level: String,
    pub due: String,
    pub paid: String,
    pub overpaid_by: String,
}

impl From<StudentBalance> for OverpaidStudentResponse {
    fn from(balance: StudentBalance) -> Self {
        Self {
            student_id_display: balance.student_id_display,
            student_name: balance.student_name,
            grade_level: balance.grade_level,
            due: format_amount(balance.due),
            paid: format_amount(balance.paid),
            overpaid_by: format_amount(-balance.balance),
        }
    }
}

/// Response for POST /api/v1/arrears/recalculate
#[derive(Debug, Serialize, Deserialize)]
pub struct RecalculateResponse {
    pub academic_year_from: String,
    pub academic_year_to: String,
    pub students_examined: usize,
    pub arrears_created: usize,
    pub arrears_replaced: u64,
    pub total_amount: String,
    pub overpaid_students: Vec<OverpaidStudentResponse>,
    pub message: String,
}

impl From<RecalculationSummary> for RecalculateResponse {
    fn from(summary: RecalculationSummary) -> Self {
        Self {
            academic_year_from: summary.academic_year_from.to_string(),
            academic_year_to: summary.academic_year_to.to_string(),
            students_examined: summary.students_examined,
            arrears_created: summary.arrears_created,
            arrears_replaced: summary.arrears_replaced,
            total_amount: format_amount(summary.total_amount),
            overpaid_students: summary
                .overpaid_students
                .into_iter()
                .map(OverpaidStudentResponse::from)
                .collect(),
            message: summary.message,
        }
    }
}

/// Query for GET /api/v1/arrears
#[derive(Debug, Default, Deserialize)]
pub struct ListArrearsQuery {
    pub academic_year_from: Option<String>,
    pub academic_year_to: Option<String>,
    pub status: Option<String>,
    pub student_id: Option<String>,
}

impl ListArrearsQuery {
    pub fn into_filter(self) -> Result<ArrearFilter> {
        Ok(ArrearFilter {
            academic_year_from: self
                .academic_year_from
                .as_deref()
                .map(AcademicYear::parse)
                .transpose()?,
            academic_year_to: self
                .academic_year_to
                .as_deref()
                .map(AcademicYear::parse)
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<ArrearStatus>)
                .transpose()?,
            student_id_display: self
                .student_id
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListArrearsResponse {
    pub arrears: Vec<ArrearResponse>,
    pub total: usize,
}

/// Query for GET /api/v1/arrears/summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub academic_year_from: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusTotalResponse {
    pub status: String,
    pub count: i64,
    pub total_amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub academic_year_from: String,
    pub academic_year_to: String,
    pub by_status: Vec<StatusTotalResponse>,
    pub total_open_amount: String,
}

impl From<LedgerSummary> for SummaryResponse {
    fn from(summary: LedgerSummary) -> Self {
        Self {
            academic_year_from: summary.academic_year_from.to_string(),
            academic_year_to: summary.academic_year_to.to_string(),
            by_status: summary
                .by_status
                .into_iter()
                .map(|t| StatusTotalResponse {
                    status: t.status.to_string(),
                    count: t.count,
                    total_amount: format_amount(t.total_amount),
                })
                .collect(),
            total_open_amount: format_amount(summary.total_open_amount),
        }
    }
}

/// Request for PATCH /api/v1/arrears/{id}
#[derive(Debug, Default, Deserialize)]
pub struct SettleArrearRequest {
    /// `"150.00"` or `150`; omitted or zero records no payment
    pub amount_paid: Option<AmountInput>,
    pub status: Option<String>,
    /// `""` clears the notes, omitted keeps them
    pub notes: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl SettleArrearRequest {
    pub fn into_command(self) -> Result<SettleArrear> {
        let amount_paid = self
            .amount_paid
            .as_ref()
            .map(AmountInput::to_decimal)
            .transpose()?;
        let requested_status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<ArrearStatus>)
            .transpose()?;

        Ok(SettleArrear {
            input: SettlementInput {
                amount_paid,
                requested_status,
                notes: self.notes,
            },
            payment_method: self.payment_method,
            payment_date: self.payment_date,
            expected_updated_at: self.expected_updated_at,
        })
    }
}

/// Response for PATCH /api/v1/arrears/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct SettleArrearResponse {
    pub arrear: ArrearResponse,
    pub receipt: Option<Receipt>,
}

fn service(pool: &web::Data<PgPool>, config: &web::Data<ArrearsConfig>) -> ArrearsService {
    ArrearsService::new(pool.get_ref().clone(), config.get_ref().clone())
}

/// POST /api/v1/arrears/recalculate
///
/// Replaces the arrears of `academic_year -> next year` with freshly computed
/// balances.
///
/// # Request Body
/// ```json
/// { "academic_year": "2024-2025", "preserve_annotations": false }
/// ```
///
/// # Returns
/// - 200: Run summary (also when no student owes anything)
/// - 400: Malformed academic year
/// - 401: Missing tenant headers
/// - 404: Unknown school
pub async fn recalculate(
    ctx: SchoolContext,
    request: web::Json<RecalculateRequest>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let command = RecalculateArrears {
        academic_year: AcademicYear::parse(&request.academic_year)?,
        preserve_annotations: request.preserve_annotations.unwrap_or(false),
    };

    let summary = service(&pool, &config).recalculate(&ctx, command).await?;

    Ok(HttpResponse::Ok().json(RecalculateResponse::from(summary)))
}

/// GET /api/v1/arrears
///
/// # Query Parameters
/// - `academic_year_from`, `academic_year_to`, `status`, `student_id` (all optional)
pub async fn list_arrears(
    ctx: SchoolContext,
    query: web::Query<ListArrearsQuery>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let filter = query.into_inner().into_filter()?;
    let arrears = service(&pool, &config).list_arrears(&ctx, &filter).await?;

    let arrears: Vec<ArrearResponse> = arrears.into_iter().map(ArrearResponse::from).collect();
    let total = arrears.len();

    Ok(HttpResponse::Ok().json(ListArrearsResponse { arrears, total }))
}

/// GET /api/v1/arrears/summary?academic_year_from=2024-2025
pub async fn arrears_summary(
    ctx: SchoolContext,
    query: web::Query<SummaryQuery>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let academic_year_from = AcademicYear::parse(&query.academic_year_from)?;
    let summary = service(&pool, &config)
        .summary(&ctx, academic_year_from)
        .await?;

    Ok(HttpResponse::Ok().json(SummaryResponse::from(summary)))
}

/// GET /api/v1/arrears/{id}
pub async fn get_arrear(
    ctx: SchoolContext,
    arrear_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let arrear = service(&pool, &config)
        .get_arrear(&ctx, arrear_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ArrearResponse::from(arrear)))
}

/// PATCH /api/v1/arrears/{id}
///
/// Applies a payment and/or status change.
///
/// # Request Body
/// ```json
/// {
///   "amount_paid": "150.00",
///   "status": "partially_paid",
///   "notes": "Paid by guardian",
///   "payment_method": "Mobile Money",
///   "payment_date": "2025-09-03",
///   "expected_updated_at": "2025-09-01T10:00:00Z"
/// }
/// ```
///
/// # Business Rules
/// - A payment above the outstanding amount needs `status` `cleared` or `waived`
/// - A recorded payment returns its receipt
///
/// # Returns
/// - 200: `{ "arrear": ..., "receipt": ... | null }`
/// - 400: Bad amount, bad status or rejected overpayment (nothing written)
/// - 404: Arrear not in the caller's school
/// - 409: `expected_updated_at` is stale
pub async fn settle_arrear(
    ctx: SchoolContext,
    arrear_id: web::Path<Uuid>,
    request: web::Json<SettleArrearRequest>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let command = request.into_inner().into_command()?;

    let outcome = service(&pool, &config)
        .settle(&ctx, arrear_id.into_inner(), command)
        .await?;

    Ok(HttpResponse::Ok().json(SettleArrearResponse {
        arrear: ArrearResponse::from(outcome.arrear),
        receipt: outcome.receipt,
    }))
}

/// DELETE /api/v1/arrears/{id}
pub async fn delete_arrear(
    ctx: SchoolContext,
    arrear_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    service(&pool, &config)
        .delete_arrear(&ctx, arrear_id.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/arrears/receipts/{payment_id}
pub async fn get_receipt(
    ctx: SchoolContext,
    payment_id: web::Path<String>,
    pool: web::Data<PgPool>,
    config: web::Data<ArrearsConfig>,
) -> Result<HttpResponse> {
    let receipt = service(&pool, &config).receipt(&ctx, &payment_id).await?;

    Ok(HttpResponse::Ok().json(receipt))
}

/// Configure arrears routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/arrears")
            .route("", web::get().to(list_arrears))
            .route("/recalculate", web::post().to(recalculate))
            .route("/summary", web::get().to(arrears_summary))
            .route("/receipts/{payment_id}", web::get().to(get_receipt))
            .route("/{id}", web::get().to(get_arrear))
            .route("/{id}", web::patch().to(settle_arrear))
            .route("/{id}", web::delete().to(delete_arrear)),
    );
}
