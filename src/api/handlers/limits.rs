use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, validated::ApiJson};
use crate::api::dtos::{requests::UpdateLimitsRequest, responses::LimitsResponse};
use crate::domain::models::limits::SchedulingLimits;
use crate::domain::services::policy::EffectiveLimits;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn get_my_limits(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let professional_id = user.professional_id()?;
    let stored = state.limits_repo.find(professional_id).await?
        .unwrap_or_else(|| SchedulingLimits {
            professional_id: professional_id.to_string(),
            ..Default::default()
        });
    let effective = EffectiveLimits::resolve(Some(&stored));
    Ok(Json(LimitsResponse { stored, effective }))
}

pub async fn put_my_limits(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateLimitsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let limits = SchedulingLimits {
        professional_id: user.professional_id()?.to_string(),
        min_booking_lead_time_minutes: payload.min_booking_lead_time_minutes,
        max_booking_days_in_advance: payload.max_booking_days_in_advance,
        reschedule_cutoff_minutes: payload.reschedule_cutoff_minutes,
        cancel_cutoff_minutes: payload.cancel_cutoff_minutes,
        max_bookings_per_slot: payload.max_bookings_per_slot,
        max_bookings_per_day: payload.max_bookings_per_day,
        max_bookings_per_week: payload.max_bookings_per_week,
        updated_at: Utc::now(),
    };
    let stored = state.limits_repo.upsert(&limits).await?;
    let effective = EffectiveLimits::resolve(Some(&stored));
    info!(professional_id = %stored.professional_id, ?effective, "Scheduling limits updated");
    Ok(Json(LimitsResponse { stored, effective }))
}
