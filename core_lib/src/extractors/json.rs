//! JSON extractor that ignores the request content type

use crate::error::AppError;
use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// Decodes the body as JSON whatever `Content-Type` the client sent. Any
/// failure to read or decode becomes [`AppError::Internal`], so callers see
/// the generic failure envelope instead of axum's plain-text rejection.
pub struct LenientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Internal(format!("Failed to read body: {}", rejection)))?;

        serde_json::from_slice(&bytes)
            .map(LenientJson)
            .map_err(|err| AppError::Internal(format!("Invalid JSON body: {}", err)))
    }
}
