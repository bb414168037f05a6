// Integration tests for year-end arrears recalculation against Postgres

#[path = "../helpers/mod.rs"]
mod helpers;

use arrears_ledger::config::ArrearsConfig;
use arrears_ledger::core::{AppError, Result, SchoolContext};
use arrears_ledger::modules::arrears::models::{ArrearFilter, ArrearStatus};
use arrears_ledger::modules::arrears::services::{
    ArrearsService, RecalculateArrears, SettleArrear, SettlementInput,
};
use chrono::NaiveDate;
use helpers::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn recalc(raw_year: &str, preserve_annotations: bool) -> RecalculateArrears {
    RecalculateArrears {
        academic_year: year(raw_year),
        preserve_annotations,
    }
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_partial_payer_gets_outstanding_arrear() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_partial_payer(&pool).await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    let summary = service.recalculate(&ctx, recalc("2024-2025", false)).await?;

    assert_eq!(summary.students_examined, 1);
    assert_eq!(summary.arrears_created, 1);
    assert_eq!(summary.arrears_replaced, 0);
    assert_eq!(summary.total_amount, dec!(400.00));

    let arrears = service.list_arrears(&ctx, &ArrearFilter::default()).await?;
    assert_eq!(arrears.len(), 1);
    let arrear = &arrears[0];
    assert_eq!(arrear.student_id_display, "S1");
    assert_eq!(arrear.student_name, "Ama Mensah");
    assert_eq!(arrear.grade_level_at_arrear, "Basic 1");
    assert_eq!(arrear.amount, dec!(400.00));
    assert_eq!(arrear.status, ArrearStatus::Outstanding);
    assert_eq!(arrear.academic_year_from.to_string(), "2024-2025");
    assert_eq!(arrear.academic_year_to.to_string(), "2025-2026");

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_recalculation_replaces_previous_rows() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_partial_payer(&pool).await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    service.recalculate(&ctx, recalc("2024-2025", false)).await?;
    let first = service.list_arrears(&ctx, &ArrearFilter::default()).await?;

    let second_run = service.recalculate(&ctx, recalc("2024-2025", false)).await?;
    let second = service.list_arrears(&ctx, &ArrearFilter::default()).await?;

    assert_eq!(second_run.arrears_replaced, 1);
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].student_id_display, second[0].student_id_display);
    assert_eq!(first[0].amount, second[0].amount);
    assert_ne!(first[0].id, second[0].id);

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_no_arrears_is_a_successful_run() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_school(&pool).await;
    seed_student(&pool, ctx.school_id, "S1", "Ama Mensah", "Basic 1").await;
    seed_fee_item(&pool, ctx.school_id, "Basic 1", "2024-2025", dec!(500.00)).await;
    seed_payment(
        &pool,
        ctx.school_id,
        "S1",
        dec!(500.00),
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
    )
    .await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    let summary = service.recalculate(&ctx, recalc("2024-2025", false)).await?;

    assert_eq!(summary.arrears_created, 0);
    assert_eq!(summary.message, "No arrears found for 2024-2025");
    assert!(service
        .list_arrears(&ctx, &ArrearFilter::default())
        .await?
        .is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_overpayment_reported_not_credited() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_school(&pool).await;
    seed_student(&pool, ctx.school_id, "S2", "Kofi Boateng", "Basic 2").await;
    seed_fee_item(&pool, ctx.school_id, "Basic 2", "2024-2025", dec!(800.00)).await;
    seed_payment(
        &pool,
        ctx.school_id,
        "S2",
        dec!(1000.00),
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
    )
    .await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    let summary = service.recalculate(&ctx, recalc("2024-2025", false)).await?;

    assert_eq!(summary.arrears_created, 0);
    assert_eq!(summary.overpaid_students.len(), 1);
    assert_eq!(summary.overpaid_students[0].balance, dec!(-200.00));

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_preserve_annotations_keeps_waiver() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_partial_payer(&pool).await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    service.recalculate(&ctx, recalc("2024-2025", false)).await?;
    let arrear = service.list_arrears(&ctx, &ArrearFilter::default()).await?[0].clone();
    service
        .settle(
            &ctx,
            arrear.id,
            SettleArrear {
                input: SettlementInput {
                    amount_paid: None,
                    requested_status: Some(ArrearStatus::Waived),
                    notes: Some("Board waiver".to_string()),
                },
                ..Default::default()
            },
        )
        .await?;

    service.recalculate(&ctx, recalc("2024-2025", true)).await?;
    let kept = service.list_arrears(&ctx, &ArrearFilter::default()).await?;
    assert_eq!(kept[0].status, ArrearStatus::Waived);
    assert_eq!(kept[0].notes.as_deref(), Some("Board waiver"));

    service.recalculate(&ctx, recalc("2024-2025", false)).await?;
    let reset = service.list_arrears(&ctx, &ArrearFilter::default()).await?;
    assert_eq!(reset[0].status, ArrearStatus::Outstanding);
    assert!(reset[0].notes.is_none());

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_unknown_school_is_not_found() {
    let pool = create_test_pool().await;
    let service = ArrearsService::new(pool, ArrearsConfig::default());
    let ctx = SchoolContext::new(Uuid::new_v4(), "bursar");

    let result = service.recalculate(&ctx, recalc("2024-2025", false)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_schools_are_isolated() -> Result<()> {
    let pool = create_test_pool().await;
    let school_a = seed_partial_payer(&pool).await;
    let school_b = seed_partial_payer(&pool).await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    service.recalculate(&school_a, recalc("2024-2025", false)).await?;

    let a = service.list_arrears(&school_a, &ArrearFilter::default()).await?;
    let b = service.list_arrears(&school_b, &ArrearFilter::default()).await?;
    assert_eq!(a.len(), 1);
    assert!(b.is_empty());

    let other = service.get_arrear(&school_b, a[0].id).await;
    assert!(matches!(other, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_concurrent_recalculations_leave_one_row_per_student() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_partial_payer(&pool).await;
    let service = ArrearsService::new(pool.clone(), ArrearsConfig::default());
    let other = ArrearsService::new(pool.clone(), ArrearsConfig::default());

    for round in 0..20 {
        let (a, b) = tokio::join!(
            service.recalculate(&ctx, recalc("2024-2025", round % 2 == 0)),
            other.recalculate(&ctx, recalc("2024-2025", false)),
        );
        a?;
        b?;

        let rows = service.list_arrears(&ctx, &ArrearFilter::default()).await?;
        assert_eq!(rows.len(), 1, "round {}", round);
        assert_eq!(rows[0].amount, dec!(400.00));
    }

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_database_rejects_non_consecutive_academic_years() -> Result<()> {
    let pool = create_test_pool().await;
    let ctx = seed_school(&pool).await;

    let fee_item = sqlx::query(
        r#"
        INSERT INTO school_fee_items (id, school_id, grade_level, academic_year, amount)
        VALUES ($1, $2, 'Basic 1', '2024-2026', 100.00)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ctx.school_id)
    .execute(&pool)
    .await;
    assert!(fee_item.is_err());

    let arrear = sqlx::query(
        r#"
        INSERT INTO student_arrears (
            id, school_id, student_id_display, student_name, grade_level_at_arrear,
            academic_year_from, academic_year_to, amount
        ) VALUES ($1, $2, 'S1', 'Ama Mensah', 'Basic 1', '2024-2026', '2026-2027', 100.00)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ctx.school_id)
    .execute(&pool)
    .await;
    assert!(arrear.is_err());

    // a consecutive pair is still accepted
    seed_fee_item(&pool, ctx.school_id, "Basic 1", "2024-2025", dec!(100.00)).await;

    Ok(())
}
