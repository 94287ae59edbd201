use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::validated::ApiJson;
use crate::api::dtos::requests::{CancelBookingRequest, RescheduleBookingRequest};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

// The manage token in the path is the only credential these routes take.

pub async fn get_booking_by_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.find_by_token(&token, Utc::now()).await?;
    Ok(Json(booking))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ApiJson(payload): ApiJson<RescheduleBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service
        .reschedule_by_token(&token, payload.date, payload.time_slot, Utc::now())
        .await?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Option<ApiJson<CancelBookingRequest>>,
) -> Result<impl IntoResponse, AppError> {
    // a bare PUT cancels without a reason
    let reason = payload.and_then(|ApiJson(body)| body.reason);
    let booking = state.booking_service.cancel_by_token(&token, reason, Utc::now()).await?;
    Ok(Json(booking))
}
