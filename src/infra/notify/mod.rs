pub mod http_notifier;
pub mod log_notifier;
