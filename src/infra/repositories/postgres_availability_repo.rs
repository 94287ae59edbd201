use crate::domain::{
    models::availability::{AvailabilityWindow, WeeklySchedule},
    ports::AvailabilityRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAvailabilityRepo {
    pool: PgPool,
}

impl PostgresAvailabilityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepo {
    async fn get_schedule(&self, professional_id: &str) -> Result<WeeklySchedule, AppError> {
        let windows = sqlx::query_as::<_, AvailabilityWindow>(
            "SELECT weekday, start_minute, end_minute FROM weekly_availability WHERE professional_id = $1 ORDER BY weekday, start_minute"
        ).bind(professional_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok(WeeklySchedule::from_windows(windows))
    }

    async fn replace_schedule(&self, professional_id: &str, schedule: &WeeklySchedule) -> Result<WeeklySchedule, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM weekly_availability WHERE professional_id = $1")
            .bind(professional_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        for window in schedule.windows() {
            sqlx::query("INSERT INTO weekly_availability (professional_id, weekday, start_minute, end_minute) VALUES ($1, $2, $3, $4)")
                .bind(professional_id)
                .bind(window.weekday)
                .bind(i32::from(window.slot.start()))
                .bind(i32::from(window.slot.end()))
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(schedule.clone())
    }
}
