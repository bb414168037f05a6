// Test data seeding
//
// Every seeded row belongs to a freshly generated school id.

use arrears_ledger::core::{AcademicYear, SchoolContext};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub fn year(raw: &str) -> AcademicYear {
    AcademicYear::parse(raw).expect("valid academic year")
}

/// Insert a school and return a context acting on it
pub async fn seed_school(pool: &PgPool) -> SchoolContext {
    let school_id = Uuid::new_v4();

    sqlx::query("INSERT INTO schools (id, name, location, logo_url) VALUES ($1, $2, $3, $4)")
        .bind(school_id)
        .bind(format!("Test School {}", school_id))
        .bind("Accra")
        .bind(Option::<String>::None)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to seed school {}: {}", school_id, e));

    SchoolContext::new(school_id, "test-bursar")
}

pub async fn seed_student(pool: &PgPool, school_id: Uuid, student_id: &str, name: &str, grade: &str) {
    sqlx::query(
        r#"
        INSERT INTO students (school_id, student_id_display, full_name, grade_level)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(school_id)
    .bind(student_id)
    .bind(name)
    .bind(grade)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("Failed to seed student {}: {}", student_id, e));
}

pub async fn seed_fee_item(
    pool: &PgPool,
    school_id: Uuid,
    grade: &str,
    academic_year: &str,
    amount: Decimal,
) {
    sqlx::query(
        r#"
        INSERT INTO school_fee_items (id, school_id, grade_level, academic_year, description, amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(school_id)
    .bind(grade)
    .bind(academic_year)
    .bind("Tuition")
    .bind(amount)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("Failed to seed fee item: {}", e));
}

pub async fn seed_payment(
    pool: &PgPool,
    school_id: Uuid,
    student_id: &str,
    amount: Decimal,
    payment_date: NaiveDate,
) {
    sqlx::query(
        r#"
        INSERT INTO fee_payments (
            id, payment_id_display, school_id, student_id_display,
            amount_paid, payment_date, payment_method, term_paid_for
        ) VALUES ($1, $2, $3, $4, $5, $6, 'Cash', 'Term 1')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(format!("PAY-{}", Uuid::new_v4()))
    .bind(school_id)
    .bind(student_id)
    .bind(amount)
    .bind(payment_date)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("Failed to seed payment: {}", e));
}

pub async fn count_payments(pool: &PgPool, school_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM fee_payments WHERE school_id = $1")
        .bind(school_id)
        .fetch_one(pool)
        .await
        .expect("count payments")
}

/// School, one `Basic 1` fee of 1000.00 for 2024-2025 and student S1 having paid 600.00
pub async fn seed_partial_payer(pool: &PgPool) -> SchoolContext {
    let ctx = seed_school(pool).await;
    seed_student(pool, ctx.school_id, "S1", "Ama Mensah", "Basic 1").await;
    seed_fee_item(pool, ctx.school_id, "Basic 1", "2024-2025", Decimal::new(100000, 2)).await;
    seed_payment(
        pool,
        ctx.school_id,
        "S1",
        Decimal::new(60000, 2),
        NaiveDate::from_ymd_opt(2024, 10, 5).expect("date"),
    )
    .await;
    ctx
}
