pub mod interval;
pub mod models;
pub mod ports;
pub mod services;
