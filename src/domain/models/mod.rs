pub mod availability;
pub mod blocked_time;
pub mod booking;
pub mod identity;
pub mod limits;
pub mod notification;
pub mod service;
