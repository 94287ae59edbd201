use crate::domain::{
    models::{blocked_time::BlockedTime, booking::{Booking, BookingStatus}},
    ports::BookingRepository,
    services::admission::{AdmissionPlan, LedgerSnapshot},
};
use crate::error::{AppError, BookingError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serializes admissions per professional until the surrounding transaction ends.
async fn lock_professional(conn: &mut PgConnection, professional_id: &str) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(professional_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

async fn load_snapshot(conn: &mut PgConnection, plan: &AdmissionPlan) -> Result<LedgerSnapshot, AppError> {
    let (week_start, week_end) = plan.week();
    let week_bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings
         WHERE professional_id = $1 AND booking_date >= $2 AND booking_date <= $3
           AND status NOT IN ('cancelled', 'declined')"
    )
        .bind(plan.professional_id()).bind(week_start).bind(week_end)
        .fetch_all(&mut *conn).await.map_err(AppError::Database)?;

    let day_blocks = sqlx::query_as::<_, BlockedTime>(
        "SELECT * FROM blocked_times WHERE professional_id = $1 AND block_date = $2"
    )
        .bind(plan.professional_id()).bind(plan.request.date)
        .fetch_all(&mut *conn).await.map_err(AppError::Database)?;

    Ok(LedgerSnapshot { week_bookings, day_blocks })
}

async fn stale_state(conn: &mut PgConnection, id: &str, action: &'static str) -> AppError {
    match sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&mut *conn).await {
        Ok(Some(b)) => BookingError::InvalidStateTransition { from: b.status, action }.into(),
        Ok(None) => AppError::NotFound("Booking not found".into()),
        Err(e) => AppError::Database(e),
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn admit(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_professional(&mut tx, plan.professional_id()).await?;

        let snapshot = load_snapshot(&mut tx, plan).await?;
        plan.evaluate(&snapshot)?;

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, professional_id, service_id, customer_id, guest_name, guest_email, guest_phone,
                 booking_date, start_minute, end_minute, status, payment_option, payment_status, amount_due, amount_paid,
                 paid_at, manage_token_hash, manage_token_expires_at, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.professional_id).bind(&booking.service_id).bind(&booking.customer_id)
            .bind(&booking.guest_name).bind(&booking.guest_email).bind(&booking.guest_phone)
            .bind(booking.date).bind(i32::from(booking.time_slot.start())).bind(i32::from(booking.time_slot.end()))
            .bind(booking.status.as_str()).bind(booking.payment_option.as_str()).bind(booking.payment_status.as_str())
            .bind(booking.amount_due).bind(booking.amount_paid).bind(booking.paid_at)
            .bind(&booking.manage_token_hash).bind(booking.manage_token_expires_at)
            .bind(&booking.notes).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn reschedule(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_professional(&mut tx, plan.professional_id()).await?;

        let snapshot = load_snapshot(&mut tx, plan).await?;
        plan.evaluate(&snapshot)?;

        let moved = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET booking_date = $1, start_minute = $2, end_minute = $3, updated_at = $4
             WHERE id = $5 AND status IN ('pending', 'accepted')
             RETURNING *"
        )
            .bind(plan.request.date)
            .bind(i32::from(plan.request.slot.start()))
            .bind(i32::from(plan.request.slot.end()))
            .bind(booking.updated_at)
            .bind(&booking.id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(moved) = moved else {
            return Err(stale_state(&mut tx, &booking.id, "reschedule").await);
        };
        tx.commit().await.map_err(AppError::Database)?;
        Ok(moved)
    }

    async fn transition(&self, booking: &Booking, from: BookingStatus) -> Result<Booking, AppError> {
        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, accepted_at = $2, declined_at = $3, completed_at = $4,
                 cancelled_by = $5, cancelled_at = $6, cancellation_reason = $7, updated_at = $8
             WHERE id = $9 AND status = $10
             RETURNING *"
        )
            .bind(booking.status.as_str())
            .bind(booking.accepted_at).bind(booking.declined_at).bind(booking.completed_at)
            .bind(&booking.cancelled_by).bind(booking.cancelled_at).bind(&booking.cancellation_reason)
            .bind(booking.updated_at).bind(&booking.id).bind(from.as_str())
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        match updated {
            Some(b) => Ok(b),
            None => {
                let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
                Err(stale_state(&mut conn, &booking.id, booking.status.verb()).await)
            }
        }
    }

    async fn record_payment(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $1, amount_paid = $2, paid_at = $3, updated_at = $4 WHERE id = $5 RETURNING *"
        )
            .bind(booking.payment_status.as_str()).bind(booking.amount_paid).bind(booking.paid_at)
            .bind(booking.updated_at).bind(&booking.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE manage_token_hash = $1").bind(token_hash).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE professional_id = $1 AND booking_date >= $2 AND booking_date <= $3 ORDER BY booking_date, start_minute"
        ).bind(professional_id).bind(start).bind(end).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE professional_id = $1 AND booking_date >= $2 AND booking_date <= $3 AND status NOT IN ('cancelled', 'declined')
             ORDER BY booking_date, start_minute"
        ).bind(professional_id).bind(start).bind(end).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
