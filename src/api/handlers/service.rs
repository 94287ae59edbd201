use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, validated::ApiJson};
use crate::api::dtos::requests::CreateServiceRequest;
use crate::domain::models::service::Service;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_my_services(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let services = state.service_repo.list(user.professional_id()?).await?;
    Ok(Json(services))
}

pub async fn create_my_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let professional_id = user.professional_id()?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Service name is required".into()));
    }
    if payload.duration_minutes <= 0 || payload.price_cents < 0 {
        return Err(AppError::Validation("Duration must be positive and price non-negative".into()));
    }

    let service = Service::new(
        professional_id.to_string(),
        payload.name,
        payload.duration_minutes,
        payload.price_cents,
        payload.allow_free_reservations,
    );
    let created = state.service_repo.create(&service).await?;
    info!("Created service: {} ({} min, {} cents)", created.name, created.duration_minutes, created.price_cents);
    Ok((StatusCode::CREATED, Json(created)))
}
