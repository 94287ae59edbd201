use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use crate::domain::interval::{merge, subtract, TimeRange};
use crate::domain::models::availability::WeeklySchedule;
use crate::domain::models::blocked_time::BlockedTime;
use crate::domain::models::booking::Booking;
use crate::domain::services::policy::EffectiveLimits;
use crate::error::BookingError;

pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const MAX_RANGE_DAYS: i64 = 366;
/// Latest calendar year a booking, block or query may name.
pub const MAX_SUPPORTED_YEAR: i32 = 9999;

/// Rejects dates outside years 1..=9999 so week and cutoff arithmetic
/// around them cannot leave chrono's representable range.
pub fn ensure_supported(date: NaiveDate) -> Result<NaiveDate, BookingError> {
    if (1..=MAX_SUPPORTED_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(BookingError::MalformedInput(format!(
            "Date {date} is outside the supported calendar (years 1-{MAX_SUPPORTED_YEAR})"
        )))
    }
}

/// Sunday that opens the calendar week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    date.checked_sub_signed(back).unwrap_or(NaiveDate::MIN)
}

/// Inclusive Sunday..Saturday bounds of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start.checked_add_signed(Duration::days(6)).unwrap_or(NaiveDate::MAX))
}

pub fn slot_start_utc(date: NaiveDate, slot: &TimeRange) -> DateTime<Utc> {
    // slot minutes stay inside the day, so this never leaves `date`
    let start = date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(slot.start()));
    Utc.from_utc_datetime(&start)
}

/// Active-booking occupancy around one (date, slot).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub slot: u32,
    pub day: u32,
    pub week: u32,
}

impl LedgerCounts {
    pub fn day_full(&self, limits: &EffectiveLimits) -> bool {
        limits.max_bookings_per_day.is_some_and(|cap| self.day >= cap)
    }

    pub fn week_full(&self, limits: &EffectiveLimits) -> bool {
        limits.max_bookings_per_week.is_some_and(|cap| self.week >= cap)
    }

    pub fn slot_full(&self, limits: &EffectiveLimits) -> bool {
        self.slot >= limits.max_bookings_per_slot
    }
}

/// Counts active bookings on the exact slot, the date and the date's week.
/// `exclude` drops one booking (the one being rescheduled) from every counter.
pub fn count_active(
    bookings: &[Booking],
    date: NaiveDate,
    slot: &TimeRange,
    exclude: Option<&str>,
) -> LedgerCounts {
    let week = week_start(date);
    let mut counts = LedgerCounts::default();

    for booking in bookings {
        if !booking.status.is_active() || exclude == Some(booking.id.as_str()) {
            continue;
        }
        if week_start(booking.date) != week {
            continue;
        }
        counts.week += 1;
        if booking.date == date {
            counts.day += 1;
            if booking.time_slot == *slot {
                counts.slot += 1;
            }
        }
    }
    counts
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        ensure_supported(start)?;
        ensure_supported(end)?;
        if end < start {
            return Err(BookingError::MalformedInput(format!(
                "Range end {end} is before start {start}"
            )));
        }
        if (end - start).num_days() > MAX_RANGE_DAYS {
            return Err(BookingError::MalformedInput(format!(
                "Ranges are limited to {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    /// `start..=end`, with `end` defaulting to `DEFAULT_RANGE_DAYS` after `start`.
    pub fn starting_at(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, BookingError> {
        let end = match end {
            Some(end) => end,
            None => default_end(ensure_supported(start)?)?,
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Widened to whole Sunday-aligned weeks, for loading week counters.
    pub fn covering_weeks(&self) -> Self {
        Self {
            start: week_start(self.start),
            end: week_bounds(self.end).1,
        }
    }

    /// Range to show a client: never before today, never past the advance
    /// window. Returns `None` when nothing remains after clamping.
    pub fn for_display(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limits: &EffectiveLimits,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, BookingError> {
        let today = now.date_naive();
        // a window reaching past the calendar is no window at all
        let horizon = limits
            .max_days_in_advance
            .and_then(|days| today.checked_add_signed(Duration::days(days)));

        let start = ensure_supported(start.unwrap_or(today))?;
        let end = match end {
            Some(end) => end,
            None => {
                let default_end = default_end(start)?;
                horizon.map_or(default_end, |h| h.min(default_end))
            }
        };
        // validate what the caller asked for before clamping
        Self::new(start, end)?;

        let start = start.max(today);
        let end = horizon.map_or(end, |h| end.min(h));
        if end < start {
            return Ok(None);
        }
        Self::new(start, end).map(Some)
    }
}

fn default_end(start: NaiveDate) -> Result<NaiveDate, BookingError> {
    start
        .checked_add_signed(Duration::days(DEFAULT_RANGE_DAYS))
        .ok_or_else(|| BookingError::MalformedInput(format!("Range starting {start} runs past the calendar")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<TimeRange>,
}

/// Everything the resolver reads, loaded once per request.
pub struct AvailabilitySnapshot<'a> {
    pub schedule: &'a WeeklySchedule,
    pub blocks: &'a [BlockedTime],
    pub bookings: &'a [Booking],
    pub limits: EffectiveLimits,
}

impl AvailabilitySnapshot<'_> {
    /// Bookable slots of one date. `None` means the date is closed (no
    /// template); an empty list means it is open but fully booked.
    pub fn resolve_day(&self, date: NaiveDate) -> Option<DaySlots> {
        let template = self.schedule.slots_for(date.weekday());
        if template.is_empty() {
            return None;
        }

        let blocked: Vec<TimeRange> = self
            .blocks
            .iter()
            .filter(|b| b.date == date)
            .map(|b| b.time_slot)
            .collect();
        // blocks may overlap one another
        let open = subtract(template, &merge(&blocked));

        let Some(first) = open.first() else {
            return Some(DaySlots { date, slots: Vec::new() });
        };
        let day_counts = count_active(self.bookings, date, first, None);
        if day_counts.day_full(&self.limits) || day_counts.week_full(&self.limits) {
            return Some(DaySlots { date, slots: Vec::new() });
        }

        let slots = open
            .into_iter()
            .filter(|slot| {
                !count_active(self.bookings, date, slot, None).slot_full(&self.limits)
            })
            .collect();
        Some(DaySlots { date, slots })
    }

    /// Resolves every date in `range`, dropping past dates and slots that
    /// start inside the lead-time window.
    pub fn resolve_range(&self, range: &DateRange, now: DateTime<Utc>) -> Vec<DaySlots> {
        let today = now.date_naive();
        let earliest_start = now
            .checked_add_signed(Duration::minutes(self.limits.min_lead_time_minutes))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        range
            .days()
            .filter(|date| *date >= today)
            .filter_map(|date| self.resolve_day(date))
            .map(|mut day| {
                day.slots
                    .retain(|slot| slot_start_utc(day.date, slot) >= earliest_start);
                day
            })
            .collect()
    }
}
