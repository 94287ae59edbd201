use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::{AuthUser, MaybeAuthUser}, validated::{ApiJson, ApiQuery}};
use crate::api::dtos::{
    requests::{CreateBookingRequest, DateRangeQuery, RecordPaymentRequest, UpdateStatusRequest},
    responses::BookingCreatedResponse,
};
use crate::domain::services::availability::DateRange;
use crate::domain::services::booking_service::{CreateBooking, RecordPayment};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(identity): MaybeAuthUser,
    Path(professional_id): Path<String>,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = CreateBooking {
        professional_id,
        service_id: payload.service_id,
        date: payload.date,
        time_slot: payload.time_slot,
        guest: payload.guest,
        payment_option: payload.payment_option,
        notes: payload.notes,
    };

    let created = state.booking_service
        .create_booking(request, identity.as_ref(), Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse { booking: created.booking, manage_token: created.manage_token }),
    ))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.booking_service
        .transition_status(&user.0, &booking_id, payload.status, payload.reason, Utc::now())
        .await?;
    Ok(Json(updated))
}

pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    ApiJson(payload): ApiJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment = RecordPayment {
        payment_status: payload.payment_status,
        amount_paid: payload.amount_paid,
    };
    let updated = state.booking_service
        .record_payment(&user.0, &booking_id, payment, Utc::now())
        .await?;
    Ok(Json(updated))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let professional_id = user.professional_id()?;
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());
    let range = DateRange::starting_at(start, query.end)?;

    let bookings = state.booking_service
        .list_bookings(&user.0, professional_id, range)
        .await?;
    Ok(Json(bookings))
}
