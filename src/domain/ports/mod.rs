use crate::domain::models::{
    availability::WeeklySchedule, blocked_time::BlockedTime, booking::{Booking, BookingStatus},
    limits::SchedulingLimits, notification::BookingNotification, service::Service,
};
use crate::domain::services::admission::AdmissionPlan;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn get_schedule(&self, professional_id: &str) -> Result<WeeklySchedule, AppError>;
    /// Swaps the whole template in one transaction.
    async fn replace_schedule(&self, professional_id: &str, schedule: &WeeklySchedule) -> Result<WeeklySchedule, AppError>;
}

#[async_trait]
pub trait BlockedTimeRepository: Send + Sync {
    async fn create(&self, block: &BlockedTime) -> Result<BlockedTime, AppError>;
    async fn list_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockedTime>, AppError>;
    async fn delete(&self, professional_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SchedulingLimitsRepository: Send + Sync {
    async fn find(&self, professional_id: &str) -> Result<Option<SchedulingLimits>, AppError>;
    async fn upsert(&self, limits: &SchedulingLimits) -> Result<SchedulingLimits, AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError>;
    async fn list(&self, professional_id: &str) -> Result<Vec<Service>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Re-reads the ledger, evaluates `plan` and inserts `booking`, all under
    /// one per-professional write lock.
    async fn admit(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError>;
    /// Moves the booking named by `plan.request.exclude_booking_id` to the
    /// plan's date and slot under the same lock as `admit`.
    async fn reschedule(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError>;
    /// Persists a status change only if the stored status is still `from`.
    async fn transition(&self, booking: &Booking, from: BookingStatus) -> Result<Booking, AppError>;
    async fn record_payment(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError>;
    async fn list_active_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), AppError>;
}
