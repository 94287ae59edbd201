use serde::Serialize;
use crate::domain::models::booking::Booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmed,
    BookingRescheduled,
    BookingCancelled,
    StatusChanged,
}

/// Payload handed to the delivery collaborator once a write has committed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingNotification {
    pub kind: NotificationKind,
    pub booking: Booking,
    /// Only present on confirmation, the one moment the raw token exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_url: Option<String>,
}
