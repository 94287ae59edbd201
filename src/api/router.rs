use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, availability, blocked_time, booking, booking_management, limits, service};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Public booking flow
        .route("/api/v1/professionals/{professional_id}/available-slots", get(availability::get_available_slots))
        .route("/api/v1/professionals/{professional_id}/bookings", post(booking::create_booking))

        // Customer booking management (token is the credential)
        .route("/api/v1/bookings/manage/{token}", get(booking_management::get_booking_by_token))
        .route("/api/v1/bookings/manage/{token}/reschedule", put(booking_management::reschedule_booking))
        .route("/api/v1/bookings/manage/{token}/cancel", put(booking_management::cancel_booking))

        // Professional & payments
        .route("/api/v1/bookings/{booking_id}/status", put(booking::update_status))
        .route("/api/v1/bookings/{booking_id}/payment", put(booking::record_payment))
        .route("/api/v1/me/bookings", get(booking::list_my_bookings))

        // Schedule configuration
        .route("/api/v1/me/availability", get(availability::get_my_availability).put(availability::put_my_availability))
        .route("/api/v1/me/blocked-times", get(blocked_time::list_my_blocked_times).post(blocked_time::create_my_blocked_time))
        .route("/api/v1/me/blocked-times/{block_id}", delete(blocked_time::delete_my_blocked_time))
        .route("/api/v1/me/scheduling-limits", get(limits::get_my_limits).put(limits::put_my_limits))
        .route("/api/v1/me/services", get(service::list_my_services).post(service::create_my_service))

        // Admin
        .route("/api/v1/professionals/{professional_id}/blocked-times", get(blocked_time::list_blocked_times).post(blocked_time::create_blocked_time))
        .route("/api/v1/professionals/{professional_id}/blocked-times/{block_id}", delete(blocked_time::delete_blocked_time))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
