use serde::Serialize;
use crate::domain::models::limits::SchedulingLimits;

pub const DEFAULT_MAX_BOOKINGS_PER_SLOT: u32 = 1;
pub const DEFAULT_MIN_LEAD_TIME_MINUTES: i64 = 0;

/// Stored overrides merged onto the hard-coded defaults.
///
/// Non-positive day/week caps, advance windows and cutoffs behave as if unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveLimits {
    pub min_lead_time_minutes: i64,
    pub max_days_in_advance: Option<i64>,
    pub reschedule_cutoff_minutes: Option<i64>,
    pub cancel_cutoff_minutes: Option<i64>,
    pub max_bookings_per_slot: u32,
    pub max_bookings_per_day: Option<u32>,
    pub max_bookings_per_week: Option<u32>,
}

impl Default for EffectiveLimits {
    fn default() -> Self {
        Self {
            min_lead_time_minutes: DEFAULT_MIN_LEAD_TIME_MINUTES,
            max_days_in_advance: None,
            reschedule_cutoff_minutes: None,
            cancel_cutoff_minutes: None,
            max_bookings_per_slot: DEFAULT_MAX_BOOKINGS_PER_SLOT,
            max_bookings_per_day: None,
            max_bookings_per_week: None,
        }
    }
}

impl EffectiveLimits {
    pub fn resolve(stored: Option<&SchedulingLimits>) -> Self {
        let Some(limits) = stored else {
            return Self::default();
        };

        Self {
            min_lead_time_minutes: limits
                .min_booking_lead_time_minutes
                .map_or(DEFAULT_MIN_LEAD_TIME_MINUTES, |m| i64::from(m.max(0))),
            max_days_in_advance: positive(limits.max_booking_days_in_advance).map(i64::from),
            reschedule_cutoff_minutes: positive(limits.reschedule_cutoff_minutes).map(i64::from),
            cancel_cutoff_minutes: positive(limits.cancel_cutoff_minutes).map(i64::from),
            max_bookings_per_slot: effective_max_bookings_per_slot(Some(limits)),
            max_bookings_per_day: positive(limits.max_bookings_per_day),
            max_bookings_per_week: positive(limits.max_bookings_per_week),
        }
    }
}

/// Per-slot capacity; misconfigured (zero or negative) overrides silently fall back to 1.
pub fn effective_max_bookings_per_slot(limits: Option<&SchedulingLimits>) -> u32 {
    limits
        .and_then(|l| positive(l.max_bookings_per_slot))
        .unwrap_or(DEFAULT_MAX_BOOKINGS_PER_SLOT)
}

fn positive(value: Option<i32>) -> Option<u32> {
    value.filter(|v| *v > 0).map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> SchedulingLimits {
        SchedulingLimits {
            professional_id: "pro-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_overrides() {
        let limits = EffectiveLimits::resolve(None);
        assert_eq!(limits.min_lead_time_minutes, 0);
        assert_eq!(limits.max_bookings_per_slot, 1);
        assert_eq!(limits.max_bookings_per_day, None);
        assert_eq!(limits.max_days_in_advance, None);
    }

    #[test]
    fn test_slot_capacity_clamps_to_one() {
        for bad in [Some(0), Some(-3), None] {
            let limits = SchedulingLimits { max_bookings_per_slot: bad, ..stored() };
            assert_eq!(effective_max_bookings_per_slot(Some(&limits)), 1, "{bad:?}");
        }
        let limits = SchedulingLimits { max_bookings_per_slot: Some(4), ..stored() };
        assert_eq!(effective_max_bookings_per_slot(Some(&limits)), 4);
    }

    #[test]
    fn test_overrides_are_merged() {
        let limits = SchedulingLimits {
            min_booking_lead_time_minutes: Some(120),
            max_booking_days_in_advance: Some(14),
            cancel_cutoff_minutes: Some(60),
            max_bookings_per_day: Some(0),
            max_bookings_per_week: Some(5),
            ..stored()
        };
        let effective = EffectiveLimits::resolve(Some(&limits));
        assert_eq!(effective.min_lead_time_minutes, 120);
        assert_eq!(effective.max_days_in_advance, Some(14));
        assert_eq!(effective.cancel_cutoff_minutes, Some(60));
        assert_eq!(effective.reschedule_cutoff_minutes, None);
        assert_eq!(effective.max_bookings_per_day, None);
        assert_eq!(effective.max_bookings_per_week, Some(5));
    }

    #[test]
    fn test_negative_lead_time_is_zero() {
        let limits = SchedulingLimits { min_booking_lead_time_minutes: Some(-30), ..stored() };
        assert_eq!(EffectiveLimits::resolve(Some(&limits)).min_lead_time_minutes, 0);
    }
}
