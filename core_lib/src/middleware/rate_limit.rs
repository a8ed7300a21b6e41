//! Per-client rate limiting for contact submissions

use crate::config::RateLimitConfig;
use crate::error::AppError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Sliding-window limiter keyed by client IP.
///
/// The key is the TCP peer address, which assumes the server is exposed
/// directly. Behind a reverse proxy every client shares the proxy's address
/// unless `trust_forwarded_for` is set.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// Client address for `request`: the first forwarded address when
    /// trusted and parseable, else the connection peer.
    pub fn client_ip(&self, request: &Request<Body>) -> Option<IpAddr> {
        let forwarded = self
            .trust_forwarded_for
            .then(|| request.headers().get(FORWARDED_FOR_HEADER))
            .flatten()
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        forwarded.or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Records a request from `ip`, returning the remaining budget, or the
    /// seconds until a slot frees up when the budget is spent.
    pub fn check(&self, ip: IpAddr) -> Result<usize, AppError> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<usize, AppError> {
        let mut requests = self.requests.lock();

        let entries = requests.entry(ip).or_default();
        entries.retain(|&instant| now.duration_since(instant) < self.window);

        if entries.len() >= self.max_requests {
            let oldest = entries.first().copied().unwrap_or(now);
            let reset_in = self.window.saturating_sub(now.duration_since(oldest));

            return Err(AppError::RateLimited {
                retry_after_seconds: reset_in.as_secs().max(1),
            });
        }

        entries.push(now);

        Ok(self.max_requests - entries.len())
    }

    /// Drops clients with no requests inside the current window.
    pub fn prune(&self) {
        let now = Instant::now();
        self.requests.lock().retain(|_, entries| {
            entries.retain(|&instant| now.duration_since(instant) < self.window);
            !entries.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Requests without a known client address pass through unlimited.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = limiter.client_ip(&request) else {
        return Ok(next.run(request).await);
    };

    let remaining = limiter.check(ip)?;

    let mut response = next.run(request).await;

    response.headers_mut().insert(
        "x-ratelimit-limit",
        HeaderValue::from(limiter.max_requests()),
    );
    response
        .headers_mut()
        .insert("x-ratelimit-remaining", HeaderValue::from(remaining));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::post, Router};
    use std::net::Ipv4Addr;
    use tower::ServiceExt;

    fn limiter(max_requests: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enable: true,
            max_requests,
            window_seconds: 60,
            trust_forwarded_for: false,
        })
    }

    fn proxied_limiter(max_requests: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            trust_forwarded_for: true,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_budget_is_enforced_per_ip() {
        let limiter = limiter(2);
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert_eq!(limiter.check(a).unwrap(), 1);
        assert_eq!(limiter.check(a).unwrap(), 0);
        assert!(matches!(
            limiter.check(a),
            Err(AppError::RateLimited { retry_after_seconds }) if retry_after_seconds > 0
        ));

        assert_eq!(limiter.check(b).unwrap(), 1);
    }

    #[test]
    fn test_window_expiry_frees_budget() {
        let limiter = limiter(1);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let start = Instant::now();

        assert!(limiter.check_at(ip, start).is_ok());
        assert!(limiter.check_at(ip, start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at(ip, start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_prune() {
        let limiter = limiter(3);
        limiter.check(IpAddr::V4(Ipv4Addr::LOCALHOST)).unwrap();
        assert_eq!(limiter.tracked_clients(), 1);

        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    fn app(limiter: RateLimiter) -> Router {
        Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
    }

    fn request_from(addr: Option<SocketAddr>) -> Request<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        if let Some(addr) = addr {
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request
    }

    #[tokio::test]
    async fn test_middleware_rejects_over_budget() {
        let limiter = limiter(1);
        let addr: SocketAddr = "192.0.2.7:5000".parse().unwrap();

        let response = app(limiter.clone())
            .oneshot(request_from(Some(addr)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        let response = app(limiter).oneshot(request_from(Some(addr))).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn test_unknown_peer_is_not_limited() {
        let limiter = limiter(1);
        for _ in 0..3 {
            let response = app(limiter.clone()).oneshot(request_from(None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    fn proxied_request(forwarded_for: &str) -> Request<Body> {
        let proxy: SocketAddr = "10.0.0.1:443".parse().unwrap();
        let mut request = request_from(Some(proxy));
        request
            .headers_mut()
            .insert(FORWARDED_FOR_HEADER, HeaderValue::from_str(forwarded_for).unwrap());
        request
    }

    #[test]
    fn test_client_ip_source() {
        let request = proxied_request("203.0.113.9, 10.0.0.1");

        assert_eq!(
            limiter(1).client_ip(&request),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(
            proxied_limiter(1).client_ip(&request),
            Some("203.0.113.9".parse().unwrap())
        );
        assert_eq!(
            proxied_limiter(1).client_ip(&proxied_request("garbage")),
            Some("10.0.0.1".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn test_proxied_clients_get_separate_budgets() {
        let limiter = proxied_limiter(1);

        for client in ["203.0.113.9", "203.0.113.10"] {
            let response = app(limiter.clone())
                .oneshot(proxied_request(client))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app(limiter)
            .oneshot(proxied_request("203.0.113.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
