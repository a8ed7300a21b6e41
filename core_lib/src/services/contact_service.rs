use crate::{
    error::{AppError, Result, UPSTREAM_FALLBACK_MESSAGE},
    metrics::{MetricsCollector, Outcome},
    models::{ContactForm, SubmissionResult},
    relay::{RelayError, SubmissionRelay},
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Validates contact submissions and relays them upstream.
#[derive(Clone)]
pub struct ContactService {
    relay: Option<Arc<dyn SubmissionRelay>>,
    metrics: MetricsCollector,
}

impl ContactService {
    /// `relay` is `None` when no upstream endpoint is configured.
    pub fn new(relay: Option<Arc<dyn SubmissionRelay>>, metrics: MetricsCollector) -> Self {
        Self { relay, metrics }
    }

    pub fn unconfigured() -> Self {
        Self::new(None, MetricsCollector::new())
    }

    pub fn is_configured(&self) -> bool {
        self.relay.is_some()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    #[instrument(skip_all)]
    pub async fn submit(&self, form: ContactForm) -> Result<SubmissionResult> {
        let result = self.relay_form(form).await;

        self.metrics.record(match &result {
            Ok(_) => Outcome::Relayed,
            Err(AppError::MissingFields) => Outcome::Invalid,
            Err(AppError::NotConfigured) => Outcome::NotConfigured,
            Err(AppError::UpstreamRejected) => Outcome::UpstreamRejected,
            Err(AppError::Upstream { .. }) => Outcome::UpstreamError,
            Err(_) => Outcome::Internal,
        });

        result
    }

    /// Records an unexpected failure that happened before `submit` could run,
    /// such as an unreadable request body.
    pub fn record_internal_failure(&self) {
        self.metrics.record(Outcome::Internal);
    }

    async fn relay_form(&self, form: ContactForm) -> Result<SubmissionResult> {
        let submission = form.into_submission()?;

        let relay = self.relay.as_ref().ok_or(AppError::NotConfigured)?;

        let reply = relay.forward(&submission).await.map_err(|err| {
            error!("Form submission service request failed: {}", err);
            upstream_failure(&err)
        })?;

        if !reply.is_success() {
            // Upstream detail is not passed on for logical rejections.
            error!(upstream_status = ?reply.status, upstream_message = ?reply.message(), "Upstream rejected submission");
            return Err(AppError::UpstreamRejected);
        }

        info!("Contact submission relayed");
        Ok(SubmissionResult::received())
    }
}

fn upstream_failure(err: &RelayError) -> AppError {
    AppError::Upstream {
        message: err
            .upstream_message()
            .unwrap_or(UPSTREAM_FALLBACK_MESSAGE)
            .to_string(),
    }
}
