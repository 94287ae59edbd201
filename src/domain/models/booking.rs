use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use crate::domain::interval::TimeRange;

#[derive(Debug, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Completed,
}

string_enum!(BookingStatus, "booking status", {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl BookingStatus {
    /// Active bookings occupy capacity; cancelled and declined ones are ledger-transparent.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Declined)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Declined | BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Only pending and accepted bookings may be rescheduled or cancelled.
    pub fn is_mutable(&self) -> bool {
        !self.is_terminal()
    }

    /// Verb used when reporting a refused move into this status.
    pub fn verb(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "reopen",
            BookingStatus::Accepted => "accept",
            BookingStatus::Declined => "decline",
            BookingStatus::Cancelled => "cancel",
            BookingStatus::Completed => "complete",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Declined)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    Free,
    Online,
    OnSite,
}

string_enum!(PaymentOption, "payment option", {
    Free => "free",
    Online => "online",
    OnSite => "on_site",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Unpaid => "unpaid",
    Paid => "paid",
    Refunded => "refunded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Customer,
    Professional,
}

string_enum!(CancelledBy, "cancellation actor", {
    Customer => "customer",
    Professional => "professional",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Who the booking is for: an authenticated customer or an embedded guest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Customer { customer_id: String },
    Guest(GuestInfo),
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub professional_id: String,
    pub service_id: Option<String>,
    pub customer_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    #[sqlx(rename = "booking_date")]
    pub date: NaiveDate,
    #[sqlx(flatten)]
    pub time_slot: TimeRange,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    #[sqlx(try_from = "String")]
    pub payment_option: PaymentOption,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub amount_due: i64,
    pub amount_paid: i64,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub manage_token_hash: String,
    pub manage_token_expires_at: DateTime<Utc>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub declined_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub professional_id: String,
    pub service_id: Option<String>,
    pub requester: Requester,
    pub date: NaiveDate,
    pub time_slot: TimeRange,
    pub payment_option: PaymentOption,
    pub amount_due: i64,
    pub notes: Option<String>,
    pub manage_token_hash: String,
    pub manage_token_expires_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let (customer_id, guest) = match params.requester {
            Requester::Customer { customer_id } => (Some(customer_id), None),
            Requester::Guest(guest) => (None, Some(guest)),
        };

        let mut booking = Self {
            id: Uuid::new_v4().to_string(),
            professional_id: params.professional_id,
            service_id: params.service_id,
            customer_id,
            guest_name: guest.as_ref().map(|g| g.name.clone()),
            guest_email: guest.as_ref().map(|g| g.email.clone()),
            guest_phone: guest.and_then(|g| g.phone),
            date: params.date,
            time_slot: params.time_slot,
            status: BookingStatus::Pending,
            payment_option: params.payment_option,
            payment_status: PaymentStatus::Unpaid,
            amount_due: params.amount_due,
            amount_paid: 0,
            paid_at: None,
            manage_token_hash: params.manage_token_hash,
            manage_token_expires_at: params.manage_token_expires_at,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            accepted_at: None,
            declined_at: None,
            completed_at: None,
            notes: params.notes,
            created_at: params.now,
            updated_at: params.now,
        };

        // Free reservations skip payment capture entirely.
        if booking.payment_option == PaymentOption::Free {
            booking.amount_due = 0;
            booking.payment_status = PaymentStatus::Paid;
            booking.paid_at = Some(params.now);
        }
        booking
    }

    /// Applies `next` with its timestamp and actor bookkeeping. Callers check
    /// `can_transition_to` first.
    pub fn apply_transition(
        &mut self,
        next: BookingStatus,
        cancelled_by: Option<CancelledBy>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        match next {
            BookingStatus::Accepted => self.accepted_at = Some(now),
            BookingStatus::Declined => self.declined_at = Some(now),
            BookingStatus::Completed => self.completed_at = Some(now),
            BookingStatus::Cancelled => {
                self.cancelled_by = cancelled_by.map(|by| by.as_str().to_string());
                self.cancelled_at = Some(now);
                self.cancellation_reason = reason;
            }
            BookingStatus::Pending => {}
        }
        self.status = next;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(option: PaymentOption) -> NewBookingParams {
        let now = Utc::now();
        NewBookingParams {
            professional_id: "pro-1".into(),
            service_id: None,
            requester: Requester::Guest(GuestInfo {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                phone: None,
            }),
            date: NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
            time_slot: "09:00-10:00".parse().unwrap(),
            payment_option: option,
            amount_due: 5000,
            notes: None,
            manage_token_hash: "hash".into(),
            manage_token_expires_at: now,
            now,
        }
    }

    #[test]
    fn test_state_machine_is_monotonic() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Declined));
        assert!(Accepted.can_transition_to(Completed));
        assert!(Accepted.can_transition_to(Cancelled));

        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Accepted.can_transition_to(Declined));
        for terminal in [Declined, Cancelled, Completed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Accepted, Declined, Cancelled, Completed] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_inactive_statuses() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::Declined.is_active());
    }

    #[test]
    fn test_free_booking_is_paid_immediately() {
        let booking = Booking::new(params(PaymentOption::Free));
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.amount_paid, 0);
        assert_eq!(booking.amount_due, 0);
        assert!(booking.paid_at.is_some());

        let paid_later = Booking::new(params(PaymentOption::OnSite));
        assert_eq!(paid_later.payment_status, PaymentStatus::Unpaid);
        assert_eq!(paid_later.amount_due, 5000);
    }

    #[test]
    fn test_serialized_booking_hides_token() {
        let json = serde_json::to_value(Booking::new(params(PaymentOption::Online))).unwrap();
        assert!(json.get("manage_token_hash").is_none());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["time_slot"]["start"], "09:00");
    }

    #[test]
    fn test_cancel_records_actor() {
        let mut booking = Booking::new(params(PaymentOption::Online));
        booking.apply_transition(BookingStatus::Cancelled, Some(CancelledBy::Customer), Some("sick".into()), Utc::now());
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_by.as_deref(), Some("customer"));
        assert_eq!(booking.cancellation_reason.as_deref(), Some("sick"));
    }
}
