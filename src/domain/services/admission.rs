use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::warn;
use crate::domain::interval::TimeRange;
use crate::domain::models::availability::WeeklySchedule;
use crate::domain::models::blocked_time::BlockedTime;
use crate::domain::models::booking::Booking;
use crate::domain::services::availability::{count_active, ensure_supported, slot_start_utc, week_bounds};
use crate::domain::services::policy::EffectiveLimits;
use crate::error::{BookingError, CapacityScope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub professional_id: String,
    pub date: NaiveDate,
    pub slot: TimeRange,
    /// Set on reschedule so the booking does not collide with itself.
    pub exclude_booking_id: Option<String>,
}

/// Live ledger state read inside the admission transaction.
#[derive(Debug, Default)]
pub struct LedgerSnapshot {
    /// Active bookings in the Sunday-aligned week of the requested date.
    pub week_bookings: Vec<Booking>,
    /// Blocked intervals on the requested date.
    pub day_blocks: Vec<BlockedTime>,
}

/// Checks that can only run against the ledger, under the store's lock.
#[derive(Debug, Clone)]
pub struct AdmissionPlan {
    pub request: AdmissionRequest,
    pub limits: EffectiveLimits,
}

impl AdmissionPlan {
    pub fn new(request: AdmissionRequest, limits: EffectiveLimits) -> Self {
        Self { request, limits }
    }

    pub fn professional_id(&self) -> &str {
        &self.request.professional_id
    }

    /// Inclusive bounds of the week the snapshot must cover.
    pub fn week(&self) -> (NaiveDate, NaiveDate) {
        week_bounds(self.request.date)
    }

    /// Every capacity and overlap violation, in reporting order.
    pub fn violations(&self, snapshot: &LedgerSnapshot) -> Vec<BookingError> {
        let req = &self.request;
        let exclude = req.exclude_booking_id.as_deref();
        let counts = count_active(&snapshot.week_bookings, req.date, &req.slot, exclude);

        let mut found = Vec::new();
        if counts.day_full(&self.limits) {
            found.push(BookingError::CapacityExceeded { scope: CapacityScope::Day });
        }
        if counts.week_full(&self.limits) {
            found.push(BookingError::CapacityExceeded { scope: CapacityScope::Week });
        }
        if counts.slot_full(&self.limits) {
            found.push(BookingError::CapacityExceeded { scope: CapacityScope::Slot });
        }

        // identical slots are governed by the slot counter above
        let straddles = snapshot.week_bookings.iter().any(|b| {
            b.status.is_active()
                && exclude != Some(b.id.as_str())
                && b.date == req.date
                && b.time_slot != req.slot
                && b.time_slot.overlaps(&req.slot)
        });
        if straddles {
            found.push(BookingError::SlotConflict);
        }

        let blocked = snapshot
            .day_blocks
            .iter()
            .any(|b| b.date == req.date && b.time_slot.overlaps(&req.slot));
        if blocked {
            found.push(BookingError::BlockedTimeConflict);
        }
        found
    }

    /// Evaluates all checks, logs each violation, and returns the first.
    pub fn evaluate(&self, snapshot: &LedgerSnapshot) -> Result<(), BookingError> {
        let violations = self.violations(snapshot);
        for violation in &violations {
            warn!(
                professional_id = %self.request.professional_id,
                date = %self.request.date,
                slot = %self.request.slot,
                code = violation.code(),
                "Admission rejected: {}", violation
            );
        }
        match violations.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}

/// The requested slot must sit inside one template interval of its weekday.
pub fn check_template(schedule: &WeeklySchedule, date: NaiveDate, slot: &TimeRange) -> Result<(), BookingError> {
    if schedule.slots_for(date.weekday()).iter().any(|open| open.contains(slot)) {
        Ok(())
    } else {
        Err(BookingError::OutsideAvailability)
    }
}

/// Lead time and advance window, both relative to `now`.
pub fn check_timing(
    limits: &EffectiveLimits,
    date: NaiveDate,
    slot: &TimeRange,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    ensure_supported(date)?;
    let start = slot_start_utc(date, slot);
    let lead = limits.min_lead_time_minutes;
    if now.checked_add_signed(Duration::minutes(lead)).is_none_or(|earliest| earliest > start) {
        return Err(BookingError::LeadTimeViolation { minutes: lead });
    }

    if let Some(days) = limits.max_days_in_advance
        && (date - now.date_naive()).num_days() > days {
        return Err(BookingError::AdvanceWindowViolation { days });
    }
    Ok(())
}

fn inside_cutoff(booking: &Booking, cutoff_minutes: Option<i64>, now: DateTime<Utc>) -> bool {
    cutoff_minutes.is_some_and(|minutes| {
        slot_start_utc(booking.date, &booking.time_slot)
            .checked_sub_signed(Duration::minutes(minutes))
            .is_none_or(|cutoff| now > cutoff)
    })
}

pub fn check_reschedule_cutoff(booking: &Booking, limits: &EffectiveLimits, now: DateTime<Utc>) -> Result<(), BookingError> {
    if inside_cutoff(booking, limits.reschedule_cutoff_minutes, now) {
        return Err(BookingError::RescheduleCutoffPassed);
    }
    Ok(())
}

pub fn check_cancel_cutoff(booking: &Booking, limits: &EffectiveLimits, now: DateTime<Utc>) -> Result<(), BookingError> {
    if inside_cutoff(booking, limits.cancel_cutoff_minutes, now) {
        return Err(BookingError::CancelCutoffPassed);
    }
    Ok(())
}
