use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, Span};
use crate::config::Config;
use crate::domain::models::identity::{Identity, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Access-token claims minted by the external auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub role: Role,
}

/// Verifies EdDSA-signed bearer tokens against the auth service's public key.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let key = DecodingKey::from_ed_pem(config.auth_public_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid AUTH_PUBLIC_KEY: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[&config.auth_audience]);
        validation.set_issuer(&[&config.auth_issuer]);

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })?;
        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts.headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub struct AuthUser(pub Identity);

impl AuthUser {
    /// Subject of a professional acting on their own schedule.
    pub fn professional_id(&self) -> Result<&str, AppError> {
        if self.0.role != Role::Professional {
            return Err(AppError::Forbidden("Only professionals manage their own schedule".into()));
        }
        Ok(&self.0.subject)
    }

    pub fn ensure_can_manage(&self, professional_id: &str) -> Result<(), AppError> {
        if !self.0.can_manage(professional_id) {
            return Err(AppError::Forbidden("Not allowed to manage this professional".into()));
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let identity = app_state.token_verifier.verify(token)?;

        Span::current().record("user_id", identity.subject.as_str());
        Ok(AuthUser(identity))
    }
}

/// Optional identity: guests book without a token, and a bad token is treated as none.
pub struct MaybeAuthUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeAuthUser(None));
        };
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let identity = app_state.token_verifier.verify(token).ok();

        if let Some(identity) = &identity {
            Span::current().record("user_id", identity.subject.as_str());
        }
        Ok(MaybeAuthUser(identity))
    }
}
