//! Application error types and handling

use crate::models::SubmissionResult;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const MISSING_FIELDS_MESSAGE: &str = "Name, email and message are required";
pub const NOT_CONFIGURED_MESSAGE: &str = "Form submission service is not configured";
pub const UPSTREAM_REJECTED_MESSAGE: &str = "Form submission service returned an error";
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "Form submission service error";
pub const INTERNAL_MESSAGE: &str = "Failed to process form submission";
pub const RATE_LIMITED_MESSAGE: &str = "Too many submissions, please try again later";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required contact fields")]
    MissingFields,

    #[error("Upstream endpoint is not configured")]
    NotConfigured,

    #[error("Upstream reported a non-success status")]
    UpstreamRejected,

    #[error("Upstream request failed: {message}")]
    Upstream { message: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFields => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotConfigured
            | AppError::UpstreamRejected
            | AppError::Upstream { .. }
            | AppError::Internal(_)
            | AppError::JsonError(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the caller. Internal detail never leaves the server.
    pub fn client_message(&self) -> String {
        match self {
            AppError::MissingFields => MISSING_FIELDS_MESSAGE.to_string(),
            AppError::NotConfigured => NOT_CONFIGURED_MESSAGE.to_string(),
            AppError::UpstreamRejected => UPSTREAM_REJECTED_MESSAGE.to_string(),
            AppError::Upstream { message } => message.clone(),
            AppError::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            AppError::Internal(_) | AppError::JsonError(_) | AppError::Other(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::MissingFields => {
                tracing::warn!("Rejected contact submission with missing fields");
            }
            AppError::RateLimited { retry_after_seconds } => {
                tracing::warn!(retry_after_seconds, "Contact submission rate limited");
            }
            AppError::NotConfigured => {
                tracing::error!("Upstream endpoint is not set, cannot relay submission");
            }
            // Logged with the upstream detail where the call is made.
            AppError::UpstreamRejected | AppError::Upstream { .. } => {}
            AppError::Internal(msg) => {
                tracing::error!("Error processing contact form submission: {}", msg);
            }
            AppError::JsonError(err) => {
                tracing::error!("JSON error: {:?}", err);
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
            }
        }

        let status = self.status_code();
        let body = Json(SubmissionResult::failure(self.client_message()));
        let mut response = (status, body).into_response();

        if let AppError::RateLimited { retry_after_seconds } = self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_seconds),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_fields_is_bad_request() {
        let response = AppError::MissingFields.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], MISSING_FIELDS_MESSAGE);
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let response = AppError::Internal("expected value at line 1 column 1".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_upstream_message_is_surfaced() {
        let response = AppError::Upstream {
            message: "Form is disabled".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Form is disabled");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_seconds: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["error"], RATE_LIMITED_MESSAGE);
    }
}
