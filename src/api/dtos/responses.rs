use serde::Serialize;
use crate::domain::models::{booking::Booking, limits::SchedulingLimits};
use crate::domain::services::policy::EffectiveLimits;

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub booking: Booking,
    /// Shown once; only its hash is stored.
    pub manage_token: String,
}

#[derive(Serialize)]
pub struct LimitsResponse {
    pub stored: SchedulingLimits,
    pub effective: EffectiveLimits,
}
