use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable the deployment uses to name the upstream form endpoint.
pub const FORMCARRY_ENDPOINT_VAR: &str = "FORMCARRY_ENDPOINT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub endpoint: Option<String>,
    /// Overall request timeout. Unset leaves the HTTP client's default.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enable: bool,
    pub max_requests: usize,
    pub window_seconds: u64,
    /// Key clients on the first `X-Forwarded-For` address instead of the TCP
    /// peer. Only safe behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl UpstreamConfig {
    /// The configured endpoint, treating an empty value as unset.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enable: true,
            max_requests: 5,
            window_seconds: 60,
            trust_forwarded_for: false,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `config.toml` if present, then `APP_*` variables,
    /// then `FORMCARRY_ENDPOINT` for the upstream address.
    pub fn load() -> Result<Self, ConfigError> {
        let file = Path::new("config.toml");
        let file = file.exists().then_some(file);

        let mut app_config = Self::load_from(file)?;
        app_config.apply_endpoint_fallback(std::env::var(FORMCARRY_ENDPOINT_VAR).ok());
        app_config.validate()?;

        Ok(app_config)
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        );

        builder.build()?.try_deserialize()
    }

    /// Fills the upstream endpoint from the deployment variable unless a
    /// non-empty endpoint was already configured.
    pub fn apply_endpoint_fallback(&mut self, value: Option<String>) {
        if self.upstream.endpoint().is_some() {
            return;
        }

        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.upstream.endpoint = Some(value);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.upstream.timeout_seconds == Some(0) {
            return Err(ConfigError::Message(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.enable && self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Message(
                "Rate limit max requests must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.enable && self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Message(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }

        if self.upstream.endpoint().is_none() {
            tracing::warn!(
                "No upstream endpoint configured ({} is unset) - contact submissions will fail",
                FORMCARRY_ENDPOINT_VAR
            );
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
