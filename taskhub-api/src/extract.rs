/// Request extractors
///
/// Wrappers around axum's `Json` and `Query` that turn rejections into
/// [`ApiError`]s, so malformed requests get the same error body as every
/// other failure.

use crate::error::ApiError;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use taskhub_shared::error::ErrorCode;
use validator::Validate;

/// JSON body that has passed `validator` checks
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(ErrorCode::InvalidRequest, e.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// JSON body with API-shaped rejections and no further checks
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(ErrorCode::InvalidRequest, e.body_text()))?;

        Ok(ApiJson(value))
    }
}

/// Query string with API-shaped rejections
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(ErrorCode::InvalidRequest, e.body_text()))?;

        Ok(ApiQuery(value))
    }
}
