use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, validated::{ApiJson, ApiQuery}};
use crate::api::dtos::requests::{CreateBlockedTimeRequest, DateRangeQuery};
use crate::domain::models::blocked_time::BlockedTime;
use crate::domain::services::availability::{ensure_supported, DateRange};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

async fn list_for(state: &AppState, professional_id: &str, query: DateRangeQuery) -> Result<Vec<BlockedTime>, AppError> {
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());
    let range = DateRange::starting_at(start, query.end)?;
    state.blocked_time_repo.list_by_range(professional_id, range.start(), range.end()).await
}

async fn create_for(
    state: &AppState,
    professional_id: &str,
    created_by: &str,
    payload: CreateBlockedTimeRequest,
) -> Result<BlockedTime, AppError> {
    let block = BlockedTime::new(
        professional_id.to_string(),
        ensure_supported(payload.date)?,
        payload.time_slot,
        payload.reason,
        created_by.to_string(),
        Utc::now(),
    );
    let created = state.blocked_time_repo.create(&block).await?;
    info!(professional_id, date = %created.date, slot = %created.time_slot, "Blocked time added");
    Ok(created)
}

pub async fn list_my_blocked_times(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(list_for(&state, user.professional_id()?, query).await?))
}

pub async fn create_my_blocked_time(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateBlockedTimeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let professional_id = user.professional_id()?;
    let created = create_for(&state, professional_id, professional_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_my_blocked_time(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(block_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.blocked_time_repo.delete(user.professional_id()?, &block_id).await?;
    info!("Deleted blocked time: {}", block_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn list_blocked_times(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(professional_id): Path<String>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.ensure_can_manage(&professional_id)?;
    Ok(Json(list_for(&state, &professional_id, query).await?))
}

pub async fn create_blocked_time(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(professional_id): Path<String>,
    ApiJson(payload): ApiJson<CreateBlockedTimeRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.ensure_can_manage(&professional_id)?;
    let created = create_for(&state, &professional_id, &user.0.subject, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_blocked_time(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((professional_id, block_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    user.ensure_can_manage(&professional_id)?;
    state.blocked_time_repo.delete(&professional_id, &block_id).await?;
    info!("Deleted blocked time {} of {}", block_id, professional_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
