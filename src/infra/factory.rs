use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::api::extractors::auth::TokenVerifier;
use crate::config::Config;
use crate::domain::ports::{
    AvailabilityRepository, BlockedTimeRepository, BookingRepository, Notifier,
    SchedulingLimitsRepository, ServiceRepository,
};
use crate::domain::services::booking_service::BookingService;
use crate::error::AppError;
use crate::infra::notify::{http_notifier::HttpNotifier, log_notifier::LogNotifier};
use crate::infra::repositories::{
    postgres_availability_repo::PostgresAvailabilityRepo, postgres_blocked_time_repo::PostgresBlockedTimeRepo,
    postgres_booking_repo::PostgresBookingRepo, postgres_limits_repo::PostgresLimitsRepo,
    postgres_service_repo::PostgresServiceRepo,
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_blocked_time_repo::SqliteBlockedTimeRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_limits_repo::SqliteLimitsRepo,
    sqlite_service_repo::SqliteServiceRepo,
};
use crate::state::AppState;

/// One implementation of every store port, all sharing a pool.
pub struct Repositories {
    pub availability: Arc<dyn AvailabilityRepository>,
    pub blocked_times: Arc<dyn BlockedTimeRepository>,
    pub limits: Arc<dyn SchedulingLimitsRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            availability: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
            blocked_times: Arc::new(SqliteBlockedTimeRepo::new(pool.clone())),
            limits: Arc::new(SqliteLimitsRepo::new(pool.clone())),
            services: Arc::new(SqliteServiceRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            availability: Arc::new(PostgresAvailabilityRepo::new(pool.clone())),
            blocked_times: Arc::new(PostgresBlockedTimeRepo::new(pool.clone())),
            limits: Arc::new(PostgresLimitsRepo::new(pool.clone())),
            services: Arc::new(PostgresServiceRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool)),
        }
    }
}

pub fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    match &config.notify_url {
        Some(url) => Arc::new(HttpNotifier::new(url.clone(), config.notify_token.clone())),
        None => Arc::new(LogNotifier),
    }
}

pub fn assemble_state(config: &Config, repos: Repositories, notifier: Arc<dyn Notifier>) -> Result<AppState, AppError> {
    let booking_service = Arc::new(BookingService::new(
        repos.bookings,
        repos.availability.clone(),
        repos.blocked_times.clone(),
        repos.limits.clone(),
        repos.services.clone(),
        notifier,
        config.manage_url_base.clone(),
    ));

    Ok(AppState {
        config: config.clone(),
        availability_repo: repos.availability,
        blocked_time_repo: repos.blocked_times,
        limits_repo: repos.limits,
        service_repo: repos.services,
        booking_service,
        token_verifier: Arc::new(TokenVerifier::new(config)?),
    })
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");
        Repositories::postgres(connect_postgres(database_url).await?)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        Repositories::sqlite(connect_sqlite(database_url).await?)
    };

    assemble_state(config, repos, build_notifier(config))
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let mut opts: PgConnectOptions = database_url.parse().map_err(AppError::Database)?;
    opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Postgres migrations failed: {e}")))?;
    Ok(pool)
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("SQLite migrations failed: {e}")))?;
    Ok(pool)
}
