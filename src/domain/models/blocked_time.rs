use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::domain::interval::TimeRange;

/// One-off closed interval carved out of the weekly template on a single date.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BlockedTime {
    pub id: String,
    pub professional_id: String,
    #[sqlx(rename = "block_date")]
    pub date: NaiveDate,
    #[sqlx(flatten)]
    pub time_slot: TimeRange,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl BlockedTime {
    pub fn new(
        professional_id: String,
        date: NaiveDate,
        time_slot: TimeRange,
        reason: Option<String>,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            professional_id,
            date,
            time_slot,
            reason,
            created_by,
            created_at: now,
        }
    }
}
