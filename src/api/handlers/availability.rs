use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, validated::{ApiJson, ApiQuery}};
use crate::api::dtos::requests::DateRangeQuery;
use crate::domain::models::availability::WeeklySchedule;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<String>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days = state.booking_service
        .available_slots(&professional_id, query.start, query.end, Utc::now())
        .await?;
    Ok(Json(days))
}

pub async fn get_my_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let schedule = state.availability_repo.get_schedule(user.professional_id()?).await?;
    Ok(Json(schedule))
}

pub async fn put_my_availability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(payload): ApiJson<WeeklySchedule>,
) -> Result<impl IntoResponse, AppError> {
    let professional_id = user.professional_id()?;
    let schedule = payload.normalized()?;
    let saved = state.availability_repo.replace_schedule(professional_id, &schedule).await?;
    info!(professional_id, windows = saved.windows().len(), "Weekly availability replaced");
    Ok(Json(saved))
}
