use std::sync::Arc;
use crate::api::extractors::auth::TokenVerifier;
use crate::config::Config;
use crate::domain::ports::{
    AvailabilityRepository, BlockedTimeRepository,
    SchedulingLimitsRepository, ServiceRepository,
};
use crate::domain::services::booking_service::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub blocked_time_repo: Arc<dyn BlockedTimeRepository>,
    pub limits_repo: Arc<dyn SchedulingLimitsRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub booking_service: Arc<BookingService>,
    pub token_verifier: Arc<TokenVerifier>,
}
