pub mod availability;
pub mod blocked_time;
pub mod booking;
pub mod booking_management;
pub mod health;
pub mod limits;
pub mod service;
