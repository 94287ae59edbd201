use slot_engine::{
    api::{extractors::auth::Claims, router::create_router},
    config::Config,
    domain::models::{identity::Role, notification::BookingNotification},
    domain::ports::Notifier,
    error::AppError,
    infra::factory::{assemble_state, Repositories},
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;

pub const ISSUER: &str = "https://auth.test.local";
pub const AUDIENCE: &str = "slot-engine-test";

/// Keeps every notification so tests can inspect what would have been sent.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<BookingNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(StdDuration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            auth_public_key: pub_key_pem.to_string(),
            auth_issuer: ISSUER.to_string(),
            auth_audience: AUDIENCE.to_string(),
            notify_url: None,
            notify_token: String::new(),
            manage_url_base: "http://localhost/manage".to_string(),
        };

        let notifier = Arc::new(RecordingNotifier::default());
        let state = assemble_state(&config, Repositories::sqlite(pool.clone()), notifier.clone())
            .expect("Failed to assemble state");
        let state = Arc::new(state);
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            notifier,
        }
    }

    /// Mints a bearer token the way the auth service would.
    pub fn token_for(&self, subject: &str, role: Role) -> String {
        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            aud: AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
            role,
        };
        let key = EncodingKey::from_ed_pem(priv_key_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Sends `body` verbatim as JSON, for payloads `serde_json` would never produce.
    pub async fn request_raw(&self, method: &str, uri: &str, body: &str) -> Response {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Saves a weekly template for `professional_id` through the API.
    pub async fn set_schedule(&self, professional_id: &str, schedule: Value) {
        let token = self.token_for(professional_id, Role::Professional);
        let res = self.request("PUT", "/api/v1/me/availability", Some(&token), Some(schedule)).await;
        assert!(res.status().is_success(), "schedule update failed: {}", res.status());
    }

    pub async fn set_limits(&self, professional_id: &str, limits: Value) {
        let token = self.token_for(professional_id, Role::Professional);
        let res = self.request("PUT", "/api/v1/me/scheduling-limits", Some(&token), Some(limits)).await;
        assert!(res.status().is_success(), "limits update failed: {}", res.status());
    }

    pub async fn book_as_guest(&self, professional_id: &str, date: NaiveDate, slot: &str) -> Response {
        let payload = serde_json::json!({
            "date": date.to_string(),
            "time_slot": slot,
            "guest": { "name": "Guest", "email": "guest@example.com" },
            "payment_option": "on_site"
        });
        self.request("POST", &format!("/api/v1/professionals/{}/bookings", professional_id), None, Some(payload)).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// First `weekday` at least two weeks out, clear of lead-time limits.
#[allow(dead_code)]
pub fn upcoming(weekday: Weekday) -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(14);
    while date.weekday() != weekday {
        date += Duration::days(1);
    }
    date
}
