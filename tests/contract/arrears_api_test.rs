// Contract tests for the arrears HTTP API
//
// The pool never connects: every request here must be answered before the
// service touches the database.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{test, web, App};
use arrears_ledger::config::ArrearsConfig;
use arrears_ledger::core::context::{ACTING_USER_HEADER, SCHOOL_ID_HEADER};
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! init_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(helpers::lazy_pool()))
                .app_data(web::Data::new(ArrearsConfig::default()))
                .configure(arrears_ledger::configure),
        )
        .await
    };
}

fn tenant(req: test::TestRequest) -> test::TestRequest {
    req.insert_header((SCHOOL_ID_HEADER, Uuid::new_v4().to_string()))
        .insert_header((ACTING_USER_HEADER, "bursar"))
}

async fn assert_error(resp: actix_web::dev::ServiceResponse, status: u16) -> Value {
    assert_eq!(resp.status().as_u16(), status);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], status);
    assert!(body["error"]["message"].is_string());
    body
}

#[actix_web::test]
async fn test_health_contract() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_missing_tenant_is_unauthorized() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/api/v1/arrears").to_request();
    let resp = test::call_service(&app, req).await;

    let body = assert_error(resp, 401).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains(SCHOOL_ID_HEADER));
}

#[actix_web::test]
async fn test_malformed_school_id_is_unauthorized() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/arrears/recalculate")
        .insert_header((SCHOOL_ID_HEADER, "school-1"))
        .insert_header((ACTING_USER_HEADER, "bursar"))
        .set_json(json!({ "academic_year": "2024-2025" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_error(resp, 401).await;
}

#[actix_web::test]
async fn test_missing_acting_user_is_unauthorized() {
    let app = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/arrears")
        .insert_header((SCHOOL_ID_HEADER, Uuid::new_v4().to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_error(resp, 401).await;
}

#[actix_web::test]
async fn test_recalculate_rejects_malformed_year() {
    let app = init_app!();

    for year in ["2024/2025", "24-25", "2024-2026", ""] {
        let req = tenant(test::TestRequest::post())
            .uri("/api/v1/arrears/recalculate")
            .set_json(json!({ "academic_year": year }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error(resp, 400).await;
    }
}

#[actix_web::test]
async fn test_recalculate_rejects_invalid_body() {
    let app = init_app!();

    let req = tenant(test::TestRequest::post())
        .uri("/api/v1/arrears/recalculate")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"academic_year\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_error(resp, 400).await;

    let req = tenant(test::TestRequest::post())
        .uri("/api/v1/arrears/recalculate")
        .set_json(json!({ "year": "2024-2025" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_error(resp, 400).await;
}

#[actix_web::test]
async fn test_settle_rejects_malformed_amount() {
    let app = init_app!();

    for amount in [json!("abc"), json!("-10"), json!(""), json!(true)] {
        let req = tenant(test::TestRequest::patch())
            .uri(&format!("/api/v1/arrears/{}", Uuid::new_v4()))
            .set_json(json!({ "amount_paid": amount }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error(resp, 400).await;
    }
}

#[actix_web::test]
async fn test_settle_rejects_amounts_the_ledger_cannot_store() {
    let app = init_app!();

    let cases = [
        (json!("0.004"), "decimal places"),
        (json!("99.995"), "decimal places"),
        (json!(99.995), "decimal places"),
        (json!("1e12"), "maximum"),
    ];

    for (amount, reason) in cases {
        let req = tenant(test::TestRequest::patch())
            .uri(&format!("/api/v1/arrears/{}", Uuid::new_v4()))
            .set_json(json!({ "amount_paid": amount, "status": "cleared" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        let body = assert_error(resp, 400).await;
        assert!(body["error"]["message"].as_str().unwrap().contains(reason));
    }
}

#[actix_web::test]
async fn test_settle_rejects_unknown_status() {
    let app = init_app!();

    let req = tenant(test::TestRequest::patch())
        .uri(&format!("/api/v1/arrears/{}", Uuid::new_v4()))
        .set_json(json!({ "amount_paid": "100.00", "status": "paid" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let body = assert_error(resp, 400).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("paid"));
}

#[actix_web::test]
async fn test_arrear_id_must_be_uuid() {
    let app = init_app!();

    let req = tenant(test::TestRequest::get())
        .uri("/api/v1/arrears/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_error(resp, 400).await;
}

#[actix_web::test]
async fn test_list_rejects_bad_filters() {
    let app = init_app!();

    for query in ["status=settled", "academic_year_from=2024", "academic_year_to=2025-2024"] {
        let req = tenant(test::TestRequest::get())
            .uri(&format!("/api/v1/arrears?{}", query))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error(resp, 400).await;
    }
}

#[actix_web::test]
async fn test_summary_requires_valid_year() {
    let app = init_app!();

    let req = tenant(test::TestRequest::get())
        .uri("/api/v1/arrears/summary")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, 400).await;

    let req = tenant(test::TestRequest::get())
        .uri("/api/v1/arrears/summary?academic_year_from=2024-25")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error(resp, 400).await;
}
