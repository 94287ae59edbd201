use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::Weekday;
use crate::domain::interval::{ensure_disjoint, IntervalError, TimeRange};

const WEEKDAYS_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun, Weekday::Mon, Weekday::Tue, Weekday::Wed,
    Weekday::Thu, Weekday::Fri, Weekday::Sat,
];

/// One stored template row: an open interval on a weekday (0 = Sunday).
#[derive(Debug, Clone, FromRow)]
pub struct AvailabilityWindow {
    pub weekday: i32,
    #[sqlx(flatten)]
    pub slot: TimeRange,
}

/// Recurring weekly template of a professional. Saved as a whole.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WeeklySchedule {
    pub sunday: Vec<TimeRange>,
    pub monday: Vec<TimeRange>,
    pub tuesday: Vec<TimeRange>,
    pub wednesday: Vec<TimeRange>,
    pub thursday: Vec<TimeRange>,
    pub friday: Vec<TimeRange>,
    pub saturday: Vec<TimeRange>,
}

impl WeeklySchedule {
    pub fn slots_for(&self, weekday: Weekday) -> &[TimeRange] {
        match weekday {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        }
    }

    fn slots_for_mut(&mut self, weekday: Weekday) -> &mut Vec<TimeRange> {
        match weekday {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        }
    }

    /// Sorts every weekday and rejects overlapping intervals within a day.
    pub fn normalized(mut self) -> Result<Self, IntervalError> {
        for weekday in WEEKDAYS_FROM_SUNDAY {
            let day = self.slots_for_mut(weekday);
            *day = ensure_disjoint(day)?;
        }
        Ok(self)
    }

    pub fn from_windows(windows: Vec<AvailabilityWindow>) -> Self {
        let mut schedule = Self::default();
        for window in windows {
            if let Some(weekday) = usize::try_from(window.weekday).ok().and_then(|i| WEEKDAYS_FROM_SUNDAY.get(i)) {
                schedule.slots_for_mut(*weekday).push(window.slot);
            }
        }
        for weekday in WEEKDAYS_FROM_SUNDAY {
            schedule.slots_for_mut(weekday).sort();
        }
        schedule
    }

    pub fn windows(&self) -> Vec<AvailabilityWindow> {
        WEEKDAYS_FROM_SUNDAY
            .iter()
            .flat_map(|weekday| {
                self.slots_for(*weekday).iter().map(|slot| AvailabilityWindow {
                    weekday: weekday.num_days_from_sunday() as i32,
                    slot: *slot,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        WEEKDAYS_FROM_SUNDAY.iter().all(|d| self.slots_for(*d).is_empty())
    }
}
