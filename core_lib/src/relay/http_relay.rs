use super::{RelayError, SubmissionRelay};
use crate::config::UpstreamConfig;
use crate::models::{ContactSubmission, UpstreamReply};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// reqwest-backed relay posting JSON to the configured endpoint.
#[derive(Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRelay {
    /// `timeout` of `None` keeps reqwest's own default.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, RelayError> {
        let endpoint = Url::parse(endpoint).map_err(|e| RelayError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, endpoint })
    }

    /// Builds a relay when an endpoint is configured, `None` otherwise.
    pub fn from_config(config: &UpstreamConfig) -> Result<Option<Self>, RelayError> {
        config
            .endpoint()
            .map(|endpoint| Self::new(endpoint, config.timeout_seconds.map(Duration::from_secs)))
            .transpose()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionRelay for HttpRelay {
    async fn forward(&self, submission: &ContactSubmission) -> Result<UpstreamReply, RelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref())
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let reply = UpstreamReply::from_slice(&body);

        debug!(status = status.as_u16(), upstream_status = ?reply.status, "Upstream responded");

        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                message: reply.message,
            });
        }

        Ok(reply)
    }
}
