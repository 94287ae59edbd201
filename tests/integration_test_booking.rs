mod common;

use axum::http::StatusCode;
use chrono::Weekday;
use common::{parse_body, upcoming, TestApp};
use serde_json::json;
use slot_engine::domain::models::{identity::Role, notification::NotificationKind};
use std::time::{Duration as StdDuration, Instant};

const PRO: &str = "pro-booking";

async fn setup(app: &TestApp) -> chrono::NaiveDate {
    app.set_schedule(PRO, json!({ "wednesday": ["09:00-12:00", "14:00-15:00"] })).await;
    upcoming(Weekday::Wed)
}

#[tokio::test]
async fn test_guest_booking_is_admitted_and_notified() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    let res = app.book_as_guest(PRO, wed, "14:00-15:00").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;

    let token = body["manage_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["guest_name"], "Guest");
    assert_eq!(body["booking"]["time_slot"], json!({ "start": "14:00", "end": "15:00" }));
    assert!(body["booking"].get("manage_token_hash").is_none());

    // delivery runs off the request path
    let mut sent = Vec::new();
    for _ in 0..50 {
        sent = app.notifier.sent.lock().unwrap().clone();
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::BookingConfirmed);
    assert!(sent[0].manage_url.as_deref().unwrap().ends_with(&token));
}

#[tokio::test]
async fn test_customer_booking_uses_identity() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    let token = app.token_for("cust-42", Role::Customer);

    let res = app.request("POST", &format!("/api/v1/professionals/{}/bookings", PRO), Some(&token), Some(json!({
        "date": wed.to_string(),
        "time_slot": "14:00-15:00",
        "payment_option": "online"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["booking"]["customer_id"], "cust-42");
    assert!(body["booking"]["guest_name"].is_null());
}

#[tokio::test]
async fn test_guest_without_details_is_malformed() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    let res = app.request("POST", &format!("/api/v1/professionals/{}/bookings", PRO), None, Some(json!({
        "date": wed.to_string(),
        "time_slot": "14:00-15:00",
        "guest": { "name": "", "email": "nobody" },
        "payment_option": "online"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["code"], "MalformedInput");
}

#[tokio::test]
async fn test_malformed_slot_is_rejected() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    let res = app.book_as_guest(PRO, wed, "25:00-26:00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["code"], "MalformedInput");

    let res = app.book_as_guest(PRO, wed, "10:00-09:00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_double_booking_hits_slot_capacity() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    assert_eq!(app.book_as_guest(PRO, wed, "14:00-15:00").await.status(), StatusCode::CREATED);

    let res = app.book_as_guest(PRO, wed, "14:00-15:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["code"], "CapacityExceeded");
    assert_eq!(body["scope"], "slot");
}

#[tokio::test]
async fn test_slot_capacity_of_two_admits_exactly_two() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    app.set_limits(PRO, json!({ "max_bookings_per_slot": 2 })).await;

    assert_eq!(app.book_as_guest(PRO, wed, "10:00-11:00").await.status(), StatusCode::CREATED);
    assert_eq!(app.book_as_guest(PRO, wed, "10:00-11:00").await.status(), StatusCode::CREATED);

    let res = app.book_as_guest(PRO, wed, "10:00-11:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["scope"], "slot");
}

#[tokio::test]
async fn test_day_and_week_caps() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    app.set_limits(PRO, json!({ "max_bookings_per_day": 1 })).await;

    assert_eq!(app.book_as_guest(PRO, wed, "09:00-10:00").await.status(), StatusCode::CREATED);
    let res = app.book_as_guest(PRO, wed, "14:00-15:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["scope"], "day");

    app.set_limits(PRO, json!({ "max_bookings_per_week": 1 })).await;
    let res = app.book_as_guest(PRO, wed, "14:00-15:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["scope"], "week");
}

#[tokio::test]
async fn test_partial_overlap_is_a_slot_conflict() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    assert_eq!(app.book_as_guest(PRO, wed, "09:00-10:00").await.status(), StatusCode::CREATED);

    let res = app.book_as_guest(PRO, wed, "09:30-10:30").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "SlotConflict");
}

#[tokio::test]
async fn test_blocked_time_conflict() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    let token = app.token_for(PRO, Role::Professional);
    app.request("POST", "/api/v1/me/blocked-times", Some(&token), Some(json!({
        "date": wed.to_string(),
        "time_slot": "09:00-09:30"
    }))).await;

    let res = app.book_as_guest(PRO, wed, "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "BlockedTimeConflict");
}

#[tokio::test]
async fn test_outside_availability() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    let res = app.book_as_guest(PRO, wed, "12:00-13:00").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "OutsideAvailability");

    let res = app.book_as_guest(PRO, wed.succ_opt().unwrap(), "09:00-10:00").await;
    assert_eq!(parse_body(res).await["code"], "OutsideAvailability");
}

#[tokio::test]
async fn test_lead_time_and_advance_window() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    app.set_limits(PRO, json!({ "min_booking_lead_time_minutes": 60 * 24 * 60 })).await;
    let res = app.book_as_guest(PRO, wed, "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "LeadTimeViolation");

    app.set_limits(PRO, json!({ "max_booking_days_in_advance": 7 })).await;
    let res = app.book_as_guest(PRO, wed, "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "AdvanceWindowViolation");
}

#[tokio::test]
async fn test_free_reservations_need_an_allowing_service() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    let url = format!("/api/v1/professionals/{}/bookings", PRO);
    let free = |service_id: Option<&str>| json!({
        "service_id": service_id,
        "date": wed.to_string(),
        "time_slot": "14:00-15:00",
        "guest": { "name": "Guest", "email": "guest@example.com" },
        "payment_option": "free"
    });

    let res = app.request("POST", &url, None, Some(free(None))).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse_body(res).await["code"], "FreeReservationsDisallowed");

    let token = app.token_for(PRO, Role::Professional);
    let paid_only = parse_body(app.request("POST", "/api/v1/me/services", Some(&token), Some(json!({
        "name": "Consultation", "duration_minutes": 60, "price_cents": 5000
    }))).await).await;
    let res = app.request("POST", &url, None, Some(free(paid_only["id"].as_str()))).await;
    assert_eq!(parse_body(res).await["code"], "FreeReservationsDisallowed");

    let allows_free = parse_body(app.request("POST", "/api/v1/me/services", Some(&token), Some(json!({
        "name": "Intro call", "duration_minutes": 60, "price_cents": 5000, "allow_free_reservations": true
    }))).await).await;
    let res = app.request("POST", &url, None, Some(free(allows_free["id"].as_str()))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let booking = &parse_body(res).await["booking"];
    assert_eq!(booking["payment_status"], "paid");
    assert_eq!(booking["amount_due"], 0);
}

#[tokio::test]
async fn test_service_of_another_professional_is_not_found() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;
    let other = app.token_for("pro-other", Role::Professional);
    let service = parse_body(app.request("POST", "/api/v1/me/services", Some(&other), Some(json!({
        "name": "Elsewhere", "duration_minutes": 30
    }))).await).await;

    let res = app.request("POST", &format!("/api/v1/professionals/{}/bookings", PRO), None, Some(json!({
        "service_id": service["id"],
        "date": wed.to_string(),
        "time_slot": "14:00-15:00",
        "guest": { "name": "Guest", "email": "guest@example.com" },
        "payment_option": "online"
    }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_date_past_the_calendar_is_malformed_and_releases_the_ledger() {
    let app = TestApp::new().await;
    let wed = setup(&app).await;

    let res = app.book_as_guest(PRO, chrono::NaiveDate::MAX, "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["code"], "MalformedInput");

    let res = app.book_as_guest(PRO, chrono::NaiveDate::from_ymd_opt(10000, 1, 5).unwrap(), "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // the next writer must not wait on a lock left behind
    let started = Instant::now();
    let res = app.book_as_guest(PRO, wed, "09:00-10:00").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(started.elapsed() < StdDuration::from_secs(5));
}

#[tokio::test]
async fn test_blocked_time_past_the_calendar_is_malformed() {
    let app = TestApp::new().await;
    let token = app.token_for(PRO, Role::Professional);

    let res = app.request("POST", "/api/v1/me/blocked-times", Some(&token), Some(json!({
        "date": chrono::NaiveDate::MAX.to_string(),
        "time_slot": "09:00-10:00"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["code"], "MalformedInput");
}
