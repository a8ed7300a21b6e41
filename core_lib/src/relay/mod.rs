//! Outbound relay to the upstream form submission service

mod http_relay;

pub use http_relay::HttpRelay;

use crate::models::{ContactSubmission, UpstreamReply};
use async_trait::async_trait;
use thiserror::Error;

#[async_trait]
pub trait SubmissionRelay: Send + Sync {
    /// Sends one submission upstream. A single attempt, never retried.
    async fn forward(&self, submission: &ContactSubmission) -> Result<UpstreamReply, RelayError>;
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Upstream responded with HTTP {status}")]
    Status { status: u16, message: Option<String> },

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid upstream endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl RelayError {
    /// The upstream's own error message, when its error body carried one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            RelayError::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
