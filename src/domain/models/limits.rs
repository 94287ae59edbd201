use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored admission overrides of a professional. `None` means unconstrained.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, Default, PartialEq, Eq)]
pub struct SchedulingLimits {
    pub professional_id: String,
    pub min_booking_lead_time_minutes: Option<i32>,
    pub max_booking_days_in_advance: Option<i32>,
    pub reschedule_cutoff_minutes: Option<i32>,
    pub cancel_cutoff_minutes: Option<i32>,
    pub max_bookings_per_slot: Option<i32>,
    pub max_bookings_per_day: Option<i32>,
    pub max_bookings_per_week: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
