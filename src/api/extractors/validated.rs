use axum::extract::{FromRequest, FromRequestParts, Json, OptionalFromRequest, Query, Request};
use axum::http::header;
use serde::de::DeserializeOwned;
use crate::error::AppError;

/// `Json` whose rejections surface as `MalformedInput`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Option<ApiJson<T>>` is `None` for a request without a body; a body that
/// is present must still parse.
impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let has_body = req.headers().contains_key(header::CONTENT_TYPE);
        if !has_body {
            return Ok(None);
        }
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(Some(ApiJson(value)))
    }
}

/// `Query` whose rejections surface as `MalformedInput`.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
