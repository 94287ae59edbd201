use crate::domain::models::notification::BookingNotification;
use crate::domain::ports::Notifier;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

/// Posts booking notifications to the external delivery service.
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotifier {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), AppError> {
        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        info!(booking_id = %notification.booking.id, kind = ?notification.kind, "Notification delivered");
        Ok(())
    }
}
