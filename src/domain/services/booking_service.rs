use std::sync::Arc;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info};
use crate::domain::interval::TimeRange;
use crate::domain::models::{
    booking::{Booking, BookingStatus, CancelledBy, GuestInfo, NewBookingParams, PaymentOption, PaymentStatus, Requester},
    identity::{Identity, Role},
    notification::{BookingNotification, NotificationKind},
};
use crate::domain::ports::{
    AvailabilityRepository, BlockedTimeRepository, BookingRepository, Notifier,
    SchedulingLimitsRepository, ServiceRepository,
};
use crate::domain::services::admission::{
    check_cancel_cutoff, check_reschedule_cutoff, check_template, check_timing, AdmissionPlan, AdmissionRequest,
};
use crate::domain::services::availability::{AvailabilitySnapshot, DateRange, DaySlots};
use crate::domain::services::manage_token::ManageTokenAuthority;
use crate::domain::services::policy::EffectiveLimits;
use crate::error::{AppError, BookingError};

pub struct CreateBooking {
    pub professional_id: String,
    pub service_id: Option<String>,
    pub date: NaiveDate,
    pub time_slot: TimeRange,
    pub guest: Option<GuestInfo>,
    pub payment_option: PaymentOption,
    pub notes: Option<String>,
}

pub struct CreatedBooking {
    pub booking: Booking,
    pub manage_token: String,
}

pub struct RecordPayment {
    pub payment_status: PaymentStatus,
    pub amount_paid: i64,
}

/// Admission, reschedule and cancellation against the ledger.
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    blocked_times: Arc<dyn BlockedTimeRepository>,
    limits: Arc<dyn SchedulingLimitsRepository>,
    services: Arc<dyn ServiceRepository>,
    notifier: Arc<dyn Notifier>,
    tokens: ManageTokenAuthority,
    manage_url_base: String,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        blocked_times: Arc<dyn BlockedTimeRepository>,
        limits: Arc<dyn SchedulingLimitsRepository>,
        services: Arc<dyn ServiceRepository>,
        notifier: Arc<dyn Notifier>,
        manage_url_base: String,
    ) -> Self {
        Self {
            bookings,
            availability,
            blocked_times,
            limits,
            services,
            notifier,
            tokens: ManageTokenAuthority::default(),
            manage_url_base,
        }
    }

    pub async fn effective_limits(&self, professional_id: &str) -> Result<EffectiveLimits, AppError> {
        let stored = self.limits.find(professional_id).await?;
        Ok(EffectiveLimits::resolve(stored.as_ref()))
    }

    pub async fn available_slots(
        &self,
        professional_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DaySlots>, AppError> {
        let limits = self.effective_limits(professional_id).await?;
        let Some(range) = DateRange::for_display(start, end, &limits, now)? else {
            return Ok(Vec::new());
        };

        let schedule = self.availability.get_schedule(professional_id).await?;
        if schedule.is_empty() {
            return Ok(Vec::new());
        }
        let blocks = self.blocked_times.list_by_range(professional_id, range.start(), range.end()).await?;
        let weeks = range.covering_weeks();
        let bookings = self.bookings.list_active_by_range(professional_id, weeks.start(), weeks.end()).await?;

        let snapshot = AvailabilitySnapshot {
            schedule: &schedule,
            blocks: &blocks,
            bookings: &bookings,
            limits,
        };
        Ok(snapshot.resolve_range(&range, now))
    }

    pub async fn create_booking(
        &self,
        request: CreateBooking,
        identity: Option<&Identity>,
        now: DateTime<Utc>,
    ) -> Result<CreatedBooking, AppError> {
        let requester = resolve_requester(identity, request.guest)?;

        let service = match &request.service_id {
            Some(id) => Some(
                self.services
                    .find_by_id(id)
                    .await?
                    .filter(|s| s.professional_id == request.professional_id)
                    .ok_or_else(|| AppError::NotFound("Service not found".into()))?,
            ),
            None => None,
        };

        if request.payment_option == PaymentOption::Free
            && !service.as_ref().is_some_and(|s| s.allow_free_reservations) {
            return Err(BookingError::FreeReservationsDisallowed.into());
        }

        let limits = self.effective_limits(&request.professional_id).await?;
        check_timing(&limits, request.date, &request.time_slot, now)?;

        let schedule = self.availability.get_schedule(&request.professional_id).await?;
        check_template(&schedule, request.date, &request.time_slot)?;

        let token = self.tokens.issue(now);
        let booking = Booking::new(NewBookingParams {
            professional_id: request.professional_id.clone(),
            service_id: request.service_id,
            requester,
            date: request.date,
            time_slot: request.time_slot,
            payment_option: request.payment_option,
            amount_due: service.as_ref().map_or(0, |s| s.price_cents),
            notes: request.notes,
            manage_token_hash: token.hash,
            manage_token_expires_at: token.expires_at,
            now,
        });

        let plan = AdmissionPlan::new(
            AdmissionRequest {
                professional_id: request.professional_id,
                date: request.date,
                slot: request.time_slot,
                exclude_booking_id: None,
            },
            limits,
        );
        let created = self.bookings.admit(&plan, &booking).await?;
        info!(
            booking_id = %created.id,
            professional_id = %created.professional_id,
            date = %created.date,
            slot = %created.time_slot,
            "Booking admitted"
        );

        self.dispatch(BookingNotification {
            kind: NotificationKind::BookingConfirmed,
            booking: created.clone(),
            manage_url: Some(self.manage_url(&token.raw)),
        });

        Ok(CreatedBooking { booking: created, manage_token: token.raw })
    }

    pub async fn find_by_token(&self, raw_token: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        if !ManageTokenAuthority::is_well_formed(raw_token) {
            return Err(BookingError::TokenNotFound.into());
        }
        let found = self.bookings.find_by_token_hash(&ManageTokenAuthority::hash(raw_token)).await?;
        Ok(self.tokens.verify(found, now)?)
    }

    pub async fn reschedule_by_token(
        &self,
        raw_token: &str,
        date: NaiveDate,
        time_slot: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let booking = self.find_by_token(raw_token, now).await?;
        if !booking.status.is_mutable() {
            return Err(BookingError::InvalidStateTransition { from: booking.status, action: "reschedule" }.into());
        }

        let limits = self.effective_limits(&booking.professional_id).await?;
        check_reschedule_cutoff(&booking, &limits, now)?;
        check_timing(&limits, date, &time_slot, now)?;

        let schedule = self.availability.get_schedule(&booking.professional_id).await?;
        check_template(&schedule, date, &time_slot)?;

        let plan = AdmissionPlan::new(
            AdmissionRequest {
                professional_id: booking.professional_id.clone(),
                date,
                slot: time_slot,
                exclude_booking_id: Some(booking.id.clone()),
            },
            limits,
        );
        let mut moved = booking.clone();
        moved.date = date;
        moved.time_slot = time_slot;
        moved.updated_at = now;

        let updated = self.bookings.reschedule(&plan, &moved).await?;
        info!(
            booking_id = %updated.id,
            from = %format!("{} {}", booking.date, booking.time_slot),
            to = %format!("{} {}", updated.date, updated.time_slot),
            "Booking rescheduled"
        );

        self.dispatch(BookingNotification {
            kind: NotificationKind::BookingRescheduled,
            booking: updated.clone(),
            manage_url: None,
        });
        Ok(updated)
    }

    pub async fn cancel_by_token(
        &self,
        raw_token: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut booking = self.find_by_token(raw_token, now).await?;
        let from = booking.status;
        if !from.can_transition_to(BookingStatus::Cancelled) {
            return Err(BookingError::InvalidStateTransition { from, action: "cancel" }.into());
        }

        let limits = self.effective_limits(&booking.professional_id).await?;
        check_cancel_cutoff(&booking, &limits, now)?;

        booking.apply_transition(BookingStatus::Cancelled, Some(CancelledBy::Customer), reason, now);
        let cancelled = self.bookings.transition(&booking, from).await?;
        info!(booking_id = %cancelled.id, "Booking cancelled by customer");

        self.dispatch(BookingNotification {
            kind: NotificationKind::BookingCancelled,
            booking: cancelled.clone(),
            manage_url: None,
        });
        Ok(cancelled)
    }

    /// Professional-driven moves: accept, decline, complete, cancel.
    /// Cancellation here ignores the customer cutoff.
    pub async fn transition_status(
        &self,
        identity: &Identity,
        booking_id: &str,
        next: BookingStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut booking = self.bookings.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
        if !identity.can_manage(&booking.professional_id) {
            return Err(AppError::Forbidden("Not your booking".into()));
        }

        let from = booking.status;
        if !from.can_transition_to(next) {
            return Err(BookingError::InvalidStateTransition { from, action: next.verb() }.into());
        }

        let actor = (next == BookingStatus::Cancelled).then_some(CancelledBy::Professional);
        booking.apply_transition(next, actor, reason, now);
        let updated = self.bookings.transition(&booking, from).await?;
        info!(booking_id = %updated.id, from = %from, to = %next, "Booking status changed");

        let kind = if next == BookingStatus::Cancelled {
            NotificationKind::BookingCancelled
        } else {
            NotificationKind::StatusChanged
        };
        self.dispatch(BookingNotification { kind, booking: updated.clone(), manage_url: None });
        Ok(updated)
    }

    /// Hook for the payment collaborator.
    pub async fn record_payment(
        &self,
        identity: &Identity,
        booking_id: &str,
        payment: RecordPayment,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        if !matches!(identity.role, Role::Admin | Role::Payments) {
            return Err(AppError::Forbidden("Payment updates require the payments role".into()));
        }
        if payment.amount_paid < 0 {
            return Err(BookingError::MalformedInput("amount_paid must not be negative".into()).into());
        }

        let mut booking = self.bookings.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

        booking.payment_status = payment.payment_status;
        booking.amount_paid = payment.amount_paid;
        if payment.payment_status == PaymentStatus::Paid {
            booking.paid_at = Some(now);
        }
        booking.updated_at = now;

        let updated = self.bookings.record_payment(&booking).await?;
        info!(booking_id = %updated.id, status = %updated.payment_status, amount = updated.amount_paid, "Payment recorded");
        Ok(updated)
    }

    pub async fn list_bookings(
        &self,
        identity: &Identity,
        professional_id: &str,
        range: DateRange,
    ) -> Result<Vec<Booking>, AppError> {
        if !identity.can_manage(professional_id) {
            return Err(AppError::Forbidden("Not your schedule".into()));
        }
        self.bookings.list_by_range(professional_id, range.start(), range.end()).await
    }

    fn manage_url(&self, raw_token: &str) -> String {
        format!("{}/{}", self.manage_url_base.trim_end_matches('/'), raw_token)
    }

    fn dispatch(&self, notification: BookingNotification) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notification).await {
                error!(booking_id = %notification.booking.id, "Notification hand-off failed: {}", e);
            }
        });
    }
}

/// Authenticated customers book as themselves; everyone else needs guest details.
fn resolve_requester(identity: Option<&Identity>, guest: Option<GuestInfo>) -> Result<Requester, BookingError> {
    if let Some(identity) = identity
        && identity.role == Role::Customer {
        return Ok(Requester::Customer { customer_id: identity.subject.clone() });
    }

    let guest = guest.ok_or_else(|| BookingError::MalformedInput("Guest name and email are required".into()))?;
    if guest.name.trim().is_empty() || !guest.email.contains('@') {
        return Err(BookingError::MalformedInput("Guest name and a valid email are required".into()));
    }
    Ok(Requester::Guest(guest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> GuestInfo {
        GuestInfo { name: "Ada".into(), email: "ada@example.com".into(), phone: None }
    }

    #[test]
    fn test_customer_identity_wins() {
        let customer = Identity::new("cust-9", Role::Customer);
        let requester = resolve_requester(Some(&customer), Some(guest())).unwrap();
        assert_eq!(requester, Requester::Customer { customer_id: "cust-9".into() });
    }

    #[test]
    fn test_guest_requires_contact() {
        assert!(matches!(resolve_requester(None, None), Err(BookingError::MalformedInput(_))));

        let nameless = GuestInfo { name: "  ".into(), ..guest() };
        assert!(resolve_requester(None, Some(nameless)).is_err());

        let professional = Identity::new("pro-1", Role::Professional);
        assert_eq!(
            resolve_requester(Some(&professional), Some(guest())).unwrap(),
            Requester::Guest(guest())
        );
    }
}
