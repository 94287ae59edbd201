use chrono::NaiveDate;
use serde::Deserialize;
use crate::domain::interval::TimeRange;
use crate::domain::models::booking::{BookingStatus, GuestInfo, PaymentOption, PaymentStatus};

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Option<String>,
    pub date: NaiveDate,
    pub time_slot: TimeRange,
    pub guest: Option<GuestInfo>,
    pub payment_option: PaymentOption,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleBookingRequest {
    pub date: NaiveDate,
    pub time_slot: TimeRange,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    pub payment_status: PaymentStatus,
    pub amount_paid: i64,
}

#[derive(Deserialize)]
pub struct CreateBlockedTimeRequest {
    pub date: NaiveDate,
    pub time_slot: TimeRange,
    pub reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateLimitsRequest {
    pub min_booking_lead_time_minutes: Option<i32>,
    pub max_booking_days_in_advance: Option<i32>,
    pub reschedule_cutoff_minutes: Option<i32>,
    pub cancel_cutoff_minutes: Option<i32>,
    pub max_bookings_per_slot: Option<i32>,
    pub max_bookings_per_day: Option<i32>,
    pub max_bookings_per_week: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub allow_free_reservations: bool,
}
