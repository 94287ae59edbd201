pub mod sqlite_availability_repo;
pub mod sqlite_blocked_time_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_limits_repo;
pub mod sqlite_service_repo;

pub mod postgres_availability_repo;
pub mod postgres_blocked_time_repo;
pub mod postgres_booking_repo;
pub mod postgres_limits_repo;
pub mod postgres_service_repo;
