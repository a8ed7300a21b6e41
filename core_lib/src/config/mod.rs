//! Layered application configuration

mod settings;

pub use settings::{
    AppConfig, CorsConfig, RateLimitConfig, ServerConfig, UpstreamConfig, FORMCARRY_ENDPOINT_VAR,
};
