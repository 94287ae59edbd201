use crate::domain::{models::limits::SchedulingLimits, ports::SchedulingLimitsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresLimitsRepo {
    pool: PgPool,
}

impl PostgresLimitsRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SchedulingLimitsRepository for PostgresLimitsRepo {
    async fn find(&self, professional_id: &str) -> Result<Option<SchedulingLimits>, AppError> {
        sqlx::query_as::<_, SchedulingLimits>("SELECT * FROM scheduling_limits WHERE professional_id = $1")
            .bind(professional_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert(&self, limits: &SchedulingLimits) -> Result<SchedulingLimits, AppError> {
        sqlx::query_as::<_, SchedulingLimits>(
            r#"INSERT INTO scheduling_limits (professional_id, min_booking_lead_time_minutes, max_booking_days_in_advance,
                   reschedule_cutoff_minutes, cancel_cutoff_minutes, max_bookings_per_slot, max_bookings_per_day,
                   max_bookings_per_week, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (professional_id) DO UPDATE SET
               min_booking_lead_time_minutes = EXCLUDED.min_booking_lead_time_minutes,
               max_booking_days_in_advance = EXCLUDED.max_booking_days_in_advance,
               reschedule_cutoff_minutes = EXCLUDED.reschedule_cutoff_minutes,
               cancel_cutoff_minutes = EXCLUDED.cancel_cutoff_minutes,
               max_bookings_per_slot = EXCLUDED.max_bookings_per_slot,
               max_bookings_per_day = EXCLUDED.max_bookings_per_day,
               max_bookings_per_week = EXCLUDED.max_bookings_per_week,
               updated_at = EXCLUDED.updated_at
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
