use crate::domain::models::notification::BookingNotification;
use crate::domain::ports::Notifier;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Used when no delivery service is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), AppError> {
        info!(
            booking_id = %notification.booking.id,
            kind = ?notification.kind,
            has_manage_url = notification.manage_url.is_some(),
            "Notification not delivered (no NOTIFY_URL configured)"
        );
        Ok(())
    }
}
