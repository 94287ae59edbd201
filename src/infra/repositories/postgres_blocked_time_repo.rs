use crate::domain::{models::blocked_time::BlockedTime, ports::BlockedTimeRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresBlockedTimeRepo {
    pool: PgPool,
}

impl PostgresBlockedTimeRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl BlockedTimeRepository for PostgresBlockedTimeRepo {
    async fn create(&self, block: &BlockedTime) -> Result<BlockedTime, AppError> {
        sqlx::query_as::<_, BlockedTime>(
            "INSERT INTO blocked_times (id, professional_id, block_date, start_minute, end_minute, reason, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *"
        )
            .bind(&block.id).bind(&block.professional_id).bind(block.date)
            .bind(i32::from(block.time_slot.start())).bind(i32::from(block.time_slot.end()))
            .bind(&block.reason).bind(&block.created_by).bind(block.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockedTime>, AppError> {
        sqlx::query_as::<_, BlockedTime>(
            "SELECT * FROM blocked_times WHERE professional_id = $1 AND block_date >= $2 AND block_date <= $3 ORDER BY block_date, start_minute"
        ).bind(professional_id).bind(start).bind(end).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, professional_id: &str, id: &str) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM blocked_times WHERE professional_id = $1 AND id = $2")
            .bind(professional_id).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Blocked time not found".into()));
        }
        Ok(())
    }
}
