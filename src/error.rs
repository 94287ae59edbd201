use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::domain::interval::IntervalError;
use crate::domain::models::booking::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityScope {
    Slot,
    Day,
    Week,
}

impl CapacityScope {
    pub fn message(&self) -> &'static str {
        match self {
            CapacityScope::Slot => "This slot is fully booked",
            CapacityScope::Day => "This day is fully booked",
            CapacityScope::Week => "This week is fully booked",
        }
    }
}

/// Admission and manage-token rejections. Client UIs key off `code()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid input: {0}")]
    MalformedInput(String),
    #[error("Bookings must be made at least {minutes} minutes in advance")]
    LeadTimeViolation { minutes: i64 },
    #[error("Bookings can only be made up to {days} days in advance")]
    AdvanceWindowViolation { days: i64 },
    #[error("This booking can no longer be rescheduled")]
    RescheduleCutoffPassed,
    #[error("This booking can no longer be cancelled")]
    CancelCutoffPassed,
    #[error("The requested time is outside the professional's availability")]
    OutsideAvailability,
    #[error("{}", .scope.message())]
    CapacityExceeded { scope: CapacityScope },
    #[error("The requested time overlaps another booking")]
    SlotConflict,
    #[error("The requested time is blocked")]
    BlockedTimeConflict,
    #[error("This service does not allow free reservations")]
    FreeReservationsDisallowed,
    #[error("Booking not found for this link")]
    TokenNotFound,
    #[error("This management link has expired")]
    TokenExpired,
    #[error("Cannot {action} a {from} booking")]
    InvalidStateTransition { from: BookingStatus, action: &'static str },
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::MalformedInput(_) => "MalformedInput",
            BookingError::LeadTimeViolation { .. } => "LeadTimeViolation",
            BookingError::AdvanceWindowViolation { .. } => "AdvanceWindowViolation",
            BookingError::RescheduleCutoffPassed => "RescheduleCutoffPassed",
            BookingError::CancelCutoffPassed => "CancelCutoffPassed",
            BookingError::OutsideAvailability => "OutsideAvailability",
            BookingError::CapacityExceeded { .. } => "CapacityExceeded",
            BookingError::SlotConflict => "SlotConflict",
            BookingError::BlockedTimeConflict => "BlockedTimeConflict",
            BookingError::FreeReservationsDisallowed => "FreeReservationsDisallowed",
            BookingError::TokenNotFound => "TokenNotFound",
            BookingError::TokenExpired => "TokenExpired",
            BookingError::InvalidStateTransition { .. } => "InvalidStateTransition",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            BookingError::LeadTimeViolation { .. }
            | BookingError::AdvanceWindowViolation { .. }
            | BookingError::RescheduleCutoffPassed
            | BookingError::CancelCutoffPassed
            | BookingError::OutsideAvailability
            | BookingError::FreeReservationsDisallowed => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::CapacityExceeded { .. }
            | BookingError::SlotConflict
            | BookingError::BlockedTimeConflict
            | BookingError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            BookingError::TokenNotFound => StatusCode::NOT_FOUND,
            BookingError::TokenExpired => StatusCode::GONE,
        }
    }
}

impl From<IntervalError> for BookingError {
    fn from(e: IntervalError) -> Self {
        BookingError::MalformedInput(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

/// Anything that stops the server from coming up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error("Server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IntervalError> for AppError {
    fn from(e: IntervalError) -> Self {
        AppError::Booking(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Booking(e) => {
                let mut body = json!({ "error": e.to_string(), "code": e.code() });
                if let BookingError::CapacityExceeded { scope } = e {
                    body["scope"] = json!(scope);
                }
                return (e.status(), Json(body)).into_response();
            }
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "Conflict" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal", "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "MalformedInput", msg.clone()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal", "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
