use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Service {
    pub id: String,
    pub professional_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub allow_free_reservations: bool,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(
        professional_id: String,
        name: String,
        duration_minutes: i32,
        price_cents: i64,
        allow_free_reservations: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            professional_id,
            name,
            duration_minutes,
            price_cents,
            allow_free_reservations,
            created_at: Utc::now(),
        }
    }
}
