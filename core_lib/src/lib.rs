//! Contact form relay: validates portfolio contact submissions and forwards
//! them to an upstream form-processing service.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod relay;
pub mod services;

pub use crate::config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::contact::create_contact_routes;
pub use handlers::routes::create_routes;
pub use metrics::MetricsCollector;
pub use middleware::rate_limit::RateLimiter;
pub use models::{ContactForm, ContactSubmission, SubmissionResult, UpstreamReply};
pub use relay::{HttpRelay, RelayError, SubmissionRelay};
pub use services::ContactService;

use axum::{middleware as axum_middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub contact: ContactService,
    pub metrics: MetricsCollector,
    pub rate_limiter: RateLimiter,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ContactService::unconfigured())
    }
}

impl AppState {
    pub fn new(contact: ContactService) -> Self {
        Self {
            app_name: "Contact Relay".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            metrics: contact.metrics().clone(),
            contact,
            rate_limiter: RateLimiter::new(&crate::config::RateLimitConfig::default()),
        }
    }

    /// Builds the state for a running server. An unset endpoint yields a
    /// service that answers every submission with the "not configured" error.
    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, RelayError> {
        let relay: Option<Arc<dyn SubmissionRelay>> = match HttpRelay::from_config(&config.upstream)? {
            Some(relay) => {
                info!(
                    "Relaying contact submissions to {}",
                    relay.endpoint().host_str().unwrap_or("<unknown host>")
                );
                Some(Arc::new(relay) as Arc<dyn SubmissionRelay>)
            }
            None => None,
        };

        let contact = ContactService::new(relay, MetricsCollector::new());

        Ok(Self::new(contact).with_rate_limiter(RateLimiter::new(&config.rate_limit)))
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, &AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let contact_routes = create_contact_routes(&state, config.rate_limit.enable);

    Router::new()
        .merge(create_routes())
        .merge(contact_routes)
        .layer(middleware::cors::cors_layer_from_config(&config.cors))
        .layer(middleware::logging::logging_layer())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_id_middleware,
        ))
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to bind {}: {}", addr, e)))?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Other(e.into()))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
