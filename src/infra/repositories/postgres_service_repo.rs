use crate::domain::{models::service::Service, ports::ServiceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresServiceRepo {
    pool: PgPool,
}

impl PostgresServiceRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, professional_id, name, duration_minutes, price_cents, allow_free_reservations, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
        )
            .bind(&service.id).bind(&service.professional_id).bind(&service.name)
            .bind(service.duration_minutes).bind(service.price_cents).bind(service.allow_free_reservations)
            .bind(service.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, professional_id: &str) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE professional_id = $1 ORDER BY created_at")
            .bind(professional_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
