pub mod admission;
pub mod availability;
pub mod booking_service;
pub mod manage_token;
pub mod policy;
