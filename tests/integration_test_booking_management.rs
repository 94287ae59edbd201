mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc, Weekday};
use common::{parse_body, upcoming, TestApp};
use serde_json::{json, Value};
use slot_engine::domain::models::identity::Role;
use slot_engine::error::{AppError, BookingError};

const PRO: &str = "pro-manage";

async fn booked(app: &TestApp) -> (chrono::NaiveDate, Value, String) {
    app.set_schedule(PRO, json!({ "wednesday": ["09:00-10:00", "11:00-12:00"] })).await;
    let wed = upcoming(Weekday::Wed);
    let body = parse_body(app.book_as_guest(PRO, wed, "09:00-10:00").await).await;
    let token = body["manage_token"].as_str().unwrap().to_string();
    (wed, body["booking"].clone(), token)
}

#[tokio::test]
async fn test_lookup_by_token() {
    let app = TestApp::new().await;
    let (_, booking, token) = booked(&app).await;

    let res = app.request("GET", &format!("/api/v1/bookings/manage/{}", token), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["id"], booking["id"]);
    assert!(body.get("manage_token_hash").is_none());
}

#[tokio::test]
async fn test_unknown_tokens_are_not_found() {
    let app = TestApp::new().await;
    booked(&app).await;

    let well_formed = "ab".repeat(32);
    for token in ["not-a-token", well_formed.as_str()] {
        let res = app.request("GET", &format!("/api/v1/bookings/manage/{}", token), None, None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(parse_body(res).await["code"], "TokenNotFound");
    }
}

#[tokio::test]
async fn test_expired_token_is_gone() {
    let app = TestApp::new().await;
    let (_, _, token) = booked(&app).await;

    let later = Utc::now() + Duration::days(31);
    let err = app.state.booking_service.find_by_token(&token, later).await.unwrap_err();
    assert!(matches!(err, AppError::Booking(BookingError::TokenExpired)));
}

#[tokio::test]
async fn test_self_reschedule_moves_the_booking() {
    let app = TestApp::new().await;
    let (wed, booking, token) = booked(&app).await;

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/reschedule", token), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "11:00-12:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let moved = parse_body(res).await;
    assert_eq!(moved["id"], booking["id"]);
    assert_eq!(moved["time_slot"], json!({ "start": "11:00", "end": "12:00" }));

    // the old slot is free again
    assert_eq!(app.book_as_guest(PRO, wed, "09:00-10:00").await.status(), StatusCode::CREATED);
    // and the new one is taken
    assert_eq!(app.book_as_guest(PRO, wed, "11:00-12:00").await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reschedule_onto_own_slot_is_allowed() {
    let app = TestApp::new().await;
    let (wed, _, token) = booked(&app).await;

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/reschedule", token), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "09:00-10:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reschedule_into_full_slot_is_rejected() {
    let app = TestApp::new().await;
    let (wed, _, token) = booked(&app).await;
    assert_eq!(app.book_as_guest(PRO, wed, "11:00-12:00").await.status(), StatusCode::CREATED);

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/reschedule", token), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "11:00-12:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "CapacityExceeded");
}

#[tokio::test]
async fn test_cutoffs_block_customer_changes() {
    let app = TestApp::new().await;
    let (wed, _, token) = booked(&app).await;
    app.set_limits(PRO, json!({
        "reschedule_cutoff_minutes": 60 * 24 * 60,
        "cancel_cutoff_minutes": 60 * 24 * 60
    })).await;

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/reschedule", token), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "11:00-12:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "RescheduleCutoffPassed");

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/cancel", token), None, None).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "CancelCutoffPassed");
}

#[tokio::test]
async fn test_cancelled_booking_is_terminal() {
    let app = TestApp::new().await;
    let (wed, _, token) = booked(&app).await;

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/cancel", token), None, Some(json!({
        "reason": "Changed plans"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancelled_by"], "customer");
    assert_eq!(body["cancellation_reason"], "Changed plans");

    // still readable
    let res = app.request("GET", &format!("/api/v1/bookings/manage/{}", token), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/cancel", token), None, None).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "InvalidStateTransition");

    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/reschedule", token), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "11:00-12:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_professional_status_transitions() {
    let app = TestApp::new().await;
    let (_, booking, token) = booked(&app).await;
    let id = booking["id"].as_str().unwrap();
    let pro = app.token_for(PRO, Role::Professional);
    let stranger = app.token_for("pro-stranger", Role::Professional);
    let url = format!("/api/v1/bookings/{}/status", id);

    let res = app.request("PUT", &url, Some(&stranger), Some(json!({ "status": "accepted" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("PUT", &url, None, Some(json!({ "status": "accepted" }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.request("PUT", &url, Some(&pro), Some(json!({ "status": "accepted" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "accepted");

    let res = app.request("PUT", &url, Some(&pro), Some(json!({ "status": "completed" }))).await;
    assert_eq!(parse_body(res).await["status"], "completed");

    let res = app.request("PUT", &url, Some(&pro), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "InvalidStateTransition");

    // the customer link still resolves a completed booking but cannot move it
    let res = app.request("PUT", &format!("/api/v1/bookings/manage/{}/cancel", token), None, None).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_professional_cancel_ignores_customer_cutoff() {
    let app = TestApp::new().await;
    let (_, booking, _) = booked(&app).await;
    app.set_limits(PRO, json!({ "cancel_cutoff_minutes": 60 * 24 * 60 })).await;
    let pro = app.token_for(PRO, Role::Professional);

    let res = app.request("PUT", &format!("/api/v1/bookings/{}/status", booking["id"].as_str().unwrap()), Some(&pro), Some(json!({
        "status": "cancelled",
        "reason": "Sick"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["cancelled_by"], "professional");
}

#[tokio::test]
async fn test_payment_updates_need_payments_role() {
    let app = TestApp::new().await;
    let (_, booking, _) = booked(&app).await;
    let url = format!("/api/v1/bookings/{}/payment", booking["id"].as_str().unwrap());
    let payload = json!({ "payment_status": "paid", "amount_paid": 5000 });

    let pro = app.token_for(PRO, Role::Professional);
    let res = app.request("PUT", &url, Some(&pro), Some(payload.clone())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let payments = app.token_for("payments-service", Role::Payments);
    let res = app.request("PUT", &url, Some(&payments), Some(payload)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["payment_status"], "paid");
    assert_eq!(body["amount_paid"], 5000);
    assert!(!body["paid_at"].is_null());
}

#[tokio::test]
async fn test_professional_lists_own_bookings() {
    let app = TestApp::new().await;
    let (wed, booking, _) = booked(&app).await;
    let pro = app.token_for(PRO, Role::Professional);

    let res = app.request("GET", &format!("/api/v1/me/bookings?start={}&end={}", wed, wed), Some(&pro), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], booking["id"]);

    let customer = app.token_for("cust-1", Role::Customer);
    let res = app.request("GET", "/api/v1/me/bookings", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_with_broken_body_is_rejected() {
    let app = TestApp::new().await;
    let (_, _, token) = booked(&app).await;

    let res = app.request_raw("PUT", &format!("/api/v1/bookings/manage/{}/cancel", token), "{").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["code"], "MalformedInput");

    // the booking is untouched
    let res = app.request("GET", &format!("/api/v1/bookings/manage/{}", token), None, None).await;
    assert_eq!(parse_body(res).await["status"], "pending");
}
