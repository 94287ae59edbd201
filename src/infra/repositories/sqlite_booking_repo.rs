use crate::domain::{
    models::{blocked_time::BlockedTime, booking::{Booking, BookingStatus}},
    ports::BookingRepository,
    services::admission::{AdmissionPlan, LedgerSnapshot},
};
use crate::error::{AppError, BookingError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{Instrument, Span};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// SQLite has a single writer; BEGIN IMMEDIATE takes the write lock before the
// ledger is read, so count-then-insert cannot interleave across connections.
// The transaction rolls back when dropped, including on a panicking task.
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

async fn load_snapshot(conn: &mut SqliteConnection, plan: &AdmissionPlan) -> Result<LedgerSnapshot, AppError> {
    let (week_start, week_end) = plan.week();
    let week_bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings
         WHERE professional_id = ? AND booking_date >= ? AND booking_date <= ?
           AND status NOT IN ('cancelled', 'declined')"
    )
        .bind(plan.professional_id())
        .bind(week_start)
        .bind(week_end)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    let day_blocks = sqlx::query_as::<_, BlockedTime>(
        "SELECT * FROM blocked_times WHERE professional_id = ? AND block_date = ?"
    )
        .bind(plan.professional_id())
        .bind(plan.request.date)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    Ok(LedgerSnapshot { week_bookings, day_blocks })
}

async fn insert_admitted(conn: &mut SqliteConnection, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
    let snapshot = load_snapshot(conn, plan).await?;
    plan.evaluate(&snapshot)?;

    sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (id, professional_id, service_id, customer_id, guest_name, guest_email, guest_phone,
             booking_date, start_minute, end_minute, status, payment_option, payment_status, amount_due, amount_paid,
             paid_at, manage_token_hash, manage_token_expires_at, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *"
    )
        .bind(&booking.id).bind(&booking.professional_id).bind(&booking.service_id).bind(&booking.customer_id)
        .bind(&booking.guest_name).bind(&booking.guest_email).bind(&booking.guest_phone)
        .bind(booking.date).bind(i32::from(booking.time_slot.start())).bind(i32::from(booking.time_slot.end()))
        .bind(booking.status.as_str()).bind(booking.payment_option.as_str()).bind(booking.payment_status.as_str())
        .bind(booking.amount_due).bind(booking.amount_paid).bind(booking.paid_at)
        .bind(&booking.manage_token_hash).bind(booking.manage_token_expires_at)
        .bind(&booking.notes).bind(booking.created_at).bind(booking.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)
}

async fn move_admitted(conn: &mut SqliteConnection, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
    let snapshot = load_snapshot(conn, plan).await?;
    plan.evaluate(&snapshot)?;

    let moved = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET booking_date = ?, start_minute = ?, end_minute = ?, updated_at = ?
         WHERE id = ? AND status IN ('pending', 'accepted')
         RETURNING *"
    )
        .bind(plan.request.date)
        .bind(i32::from(plan.request.slot.start()))
        .bind(i32::from(plan.request.slot.end()))
        .bind(booking.updated_at)
        .bind(&booking.id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    match moved {
        Some(b) => Ok(b),
        None => Err(stale_state(conn, &booking.id, "reschedule").await),
    }
}

/// Explains why a conditional write matched no row.
async fn stale_state(conn: &mut SqliteConnection, id: &str, action: &'static str) -> AppError {
    let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
    match current {
        Ok(Some(b)) => BookingError::InvalidStateTransition { from: b.status, action }.into(),
        Ok(None) => AppError::NotFound("Booking not found".into()),
        Err(e) => AppError::Database(e),
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn admit(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
        let pool = self.pool.clone();
        let plan = plan.clone();
        let booking = booking.clone();
        // detached: a dropped request must not leave the write lock held
        tokio::spawn(async move {
            let mut tx = pool.begin_with(BEGIN_IMMEDIATE).await.map_err(AppError::Database)?;
            let created = insert_admitted(&mut tx, &plan, &booking).await?;
            tx.commit().await.map_err(AppError::Database)?;
            Ok(created)
        }.instrument(Span::current()))
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Admission task failed: {e}")))?
    }

    async fn reschedule(&self, plan: &AdmissionPlan, booking: &Booking) -> Result<Booking, AppError> {
        let pool = self.pool.clone();
        let plan = plan.clone();
        let booking = booking.clone();
        tokio::spawn(async move {
            let mut tx = pool.begin_with(BEGIN_IMMEDIATE).await.map_err(AppError::Database)?;
            let moved = move_admitted(&mut tx, &plan, &booking).await?;
            tx.commit().await.map_err(AppError::Database)?;
            Ok(moved)
        }.instrument(Span::current()))
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Reschedule task failed: {e}")))?
    }

    async fn transition(&self, booking: &Booking, from: BookingStatus) -> Result<Booking, AppError> {
        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ?, accepted_at = ?, declined_at = ?, completed_at = ?,
                 cancelled_by = ?, cancelled_at = ?, cancellation_reason = ?, updated_at = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(booking.status.as_str())
            .bind(booking.accepted_at).bind(booking.declined_at).bind(booking.completed_at)
            .bind(&booking.cancelled_by).bind(booking.cancelled_at).bind(&booking.cancellation_reason)
            .bind(booking.updated_at)
            .bind(&booking.id)
            .bind(from.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

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
            "UPDATE bookings SET payment_status = ?, amount_paid = ?, paid_at = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
            .bind(booking.payment_status.as_str())
            .bind(booking.amount_paid)
            .bind(booking.paid_at)
            .bind(booking.updated_at)
            .bind(&booking.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE manage_token_hash = ?").bind(token_hash).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE professional_id = ? AND booking_date >= ? AND booking_date <= ? ORDER BY booking_date, start_minute"
        )
            .bind(professional_id).bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_by_range(&self, professional_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE professional_id = ? AND booking_date >= ? AND booking_date <= ? AND status NOT IN ('cancelled', 'declined')
             ORDER BY booking_date, start_minute"
        )
            .bind(professional_id).bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
