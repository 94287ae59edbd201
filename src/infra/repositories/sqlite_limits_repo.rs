use crate::domain::{models::limits::SchedulingLimits, ports::SchedulingLimitsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteLimitsRepo {
    pool: SqlitePool,
}

impl SqliteLimitsRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl SchedulingLimitsRepository for SqliteLimitsRepo {
    async fn find(&self, professional_id: &str) -> Result<Option<SchedulingLimits>, AppError> {
        sqlx::query_as::<_, SchedulingLimits>("SELECT * FROM scheduling_limits WHERE professional_id = ?")
            .bind(professional_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, limits: &SchedulingLimits) -> Result<SchedulingLimits, AppError> {
        sqlx::query_as::<_, SchedulingLimits>(
            r#"INSERT INTO scheduling_limits (professional_id, min_booking_lead_time_minutes, max_booking_days_in_advance,
                   reschedule_cutoff_minutes, cancel_cutoff_minutes, max_bookings_per_slot, max_bookings_per_day,
                   max_bookings_per_week, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(professional_id) DO UPDATE SET
               min_booking_lead_time_minutes=excluded.min_booking_lead_time_minutes,
               max_booking_days_in_advance=excluded.max_booking_days_in_advance,
               reschedule_cutoff_minutes=excluded.reschedule_cutoff_minutes,
               cancel_cutoff_minutes=excluded.cancel_cutoff_minutes,
               max_bookings_per_slot=excluded.max_bookings_per_slot,
               max_bookings_per_day=excluded.max_bookings_per_day,
               max_bookings_per_week=excluded.max_bookings_per_week,
               updated_at=excluded.updated_at
               RETURNING *"#
        )
            .bind(&limits.professional_id)
            .bind(limits.min_booking_lead_time_minutes)
            .bind(limits.max_booking_days_in_advance)
            .bind(limits.reschedule_cutoff_minutes)
            .bind(limits.cancel_cutoff_minutes)
            .bind(limits.max_bookings_per_slot)
            .bind(limits.max_bookings_per_day)
            .bind(limits.max_bookings_per_week)
            .bind(limits.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
