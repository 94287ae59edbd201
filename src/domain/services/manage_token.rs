use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use crate::domain::models::booking::Booking;
use crate::error::BookingError;

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_TTL_DAYS: i64 = 30;

/// A freshly issued token. `raw` leaves the process once and is never stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks opaque booking-management capabilities.
#[derive(Debug, Clone)]
pub struct ManageTokenAuthority {
    ttl: Duration,
}

impl Default for ManageTokenAuthority {
    fn default() -> Self {
        Self { ttl: Duration::days(TOKEN_TTL_DAYS) }
    }
}

impl ManageTokenAuthority {
    pub fn issue(&self, now: DateTime<Utc>) -> IssuedToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);

        IssuedToken {
            hash: Self::hash(&raw),
            raw,
            expires_at: now + self.ttl,
        }
    }

    pub fn hash(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Anything that is not 64 hex characters cannot have been issued here.
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == TOKEN_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Turns the result of a hash lookup into the booking, or the reason it
    /// is unusable. Terminal bookings still resolve.
    pub fn verify(&self, found: Option<Booking>, now: DateTime<Utc>) -> Result<Booking, BookingError> {
        let booking = found.ok_or(BookingError::TokenNotFound)?;
        if now > booking.manage_token_expires_at {
            return Err(BookingError::TokenExpired);
        }
        Ok(booking)
    }
}
