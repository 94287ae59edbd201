use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Malformed time '{0}' (expected HH:MM)")]
    MalformedTime(String),
    #[error("Time range {start}-{end} must start before it ends on the same day")]
    EmptyRange { start: String, end: String },
    #[error("Time ranges {0} and {1} overlap")]
    Overlapping(TimeRange, TimeRange),
}

/// Parses a strict 24h "HH:MM" string into minutes since midnight.
pub fn parse_hhmm(input: &str) -> Result<u16, IntervalError> {
    let malformed = || IntervalError::MalformedTime(input.to_string());

    let (h, m) = input.split_once(':').ok_or_else(malformed)?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(h) || !two_digits(m) {
        return Err(malformed());
    }

    let hours: u16 = h.parse().map_err(|_| malformed())?;
    let minutes: u16 = m.parse().map_err(|_| malformed())?;
    if hours > 23 || minutes > 59 {
        return Err(malformed());
    }
    Ok(hours * 60 + minutes)
}

pub fn format_hhmm(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open `[start, end)` interval in minutes since midnight, confined to one day.
///
/// This is the only slot representation past the parsing boundary. It reads
/// from `start_minute` / `end_minute` columns and serializes as
/// `{"start": "HH:MM", "end": "HH:MM"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRow, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange", into = "TimeRangeLabels")]
pub struct TimeRange {
    #[sqlx(rename = "start_minute", try_from = "i32")]
    start: u16,
    #[sqlx(rename = "end_minute", try_from = "i32")]
    end: u16,
}

impl TimeRange {
    pub fn new(start: u16, end: u16) -> Result<Self, IntervalError> {
        if start >= end || end >= MINUTES_PER_DAY {
            return Err(IntervalError::EmptyRange {
                start: format_hhmm(start),
                end: format_hhmm(end),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        Self::new(parse_hhmm(start)?, parse_hhmm(end)?)
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self, other)
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Removes `cut` from `self`, leaving zero, one or two pieces.
    pub fn minus(&self, cut: &TimeRange) -> Vec<TimeRange> {
        if !self.overlaps(cut) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start < cut.start {
            pieces.push(TimeRange { start: self.start, end: cut.start });
        }
        if cut.end < self.end {
            pieces.push(TimeRange { start: cut.end, end: self.end });
        }
        pieces
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_hhmm(self.start), format_hhmm(self.end))
    }
}

impl FromStr for TimeRange {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| IntervalError::MalformedTime(s.to_string()))?;
        Self::parse(start.trim(), end.trim())
    }
}

// Clients send either "HH:MM-HH:MM" or {"start","end"}; both collapse into TimeRange here.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeRange {
    Text(String),
    Fields { start: String, end: String },
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = IntervalError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        match raw {
            RawTimeRange::Text(s) => s.parse(),
            RawTimeRange::Fields { start, end } => TimeRange::parse(&start, &end),
        }
    }
}

#[derive(Serialize)]
struct TimeRangeLabels {
    start: String,
    end: String,
}

impl From<TimeRange> for TimeRangeLabels {
    fn from(range: TimeRange) -> Self {
        Self {
            start: format_hhmm(range.start),
            end: format_hhmm(range.end),
        }
    }
}

pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// `available − blocked`, folding each blocking interval over the remaining pieces.
///
/// Pieces are never merged with their neighbours: adjacent template slots stay
/// separate bookable units.
pub fn subtract(available: &[TimeRange], blocked: &[TimeRange]) -> Vec<TimeRange> {
    let mut remaining: Vec<TimeRange> = available.to_vec();
    remaining.sort();

    for cut in blocked {
        remaining = remaining.iter().flat_map(|piece| piece.minus(cut)).collect();
    }
    remaining
}

/// Union of possibly overlapping or touching ranges, sorted.
pub fn merge(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        if let Some(last) = merged.last_mut()
            && range.start <= last.end {
            last.end = last.end.max(range.end);
            continue;
        }
        merged.push(range);
    }
    merged
}

/// Sorts `ranges` and rejects the set if any two of them overlap.
pub fn ensure_disjoint(ranges: &[TimeRange]) -> Result<Vec<TimeRange>, IntervalError> {
    let mut sorted = ranges.to_vec();
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return Err(IntervalError::Overlapping(pair[0], pair[1]));
        }
    }
    Ok(sorted)
}
