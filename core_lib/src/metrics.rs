//! Relay outcome counters

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Relayed,
    Invalid,
    NotConfigured,
    UpstreamRejected,
    UpstreamError,
    Internal,
}

#[derive(Clone)]
pub struct MetricsCollector {
    total_submissions: Arc<AtomicU64>,
    relayed: Arc<AtomicU64>,
    invalid: Arc<AtomicU64>,
    not_configured: Arc<AtomicU64>,
    upstream_rejected: Arc<AtomicU64>,
    upstream_errors: Arc<AtomicU64>,
    internal_errors: Arc<AtomicU64>,
    last_relayed_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_submissions: u64,
    pub relayed: u64,
    pub invalid: u64,
    pub not_configured: u64,
    pub upstream_rejected: u64,
    pub upstream_errors: u64,
    pub internal_errors: u64,
    pub failure_rate: f64,
    pub last_relayed_at: Option<DateTime<Utc>>,
    pub uptime_seconds: i64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            total_submissions: Arc::new(AtomicU64::new(0)),
            relayed: Arc::new(AtomicU64::new(0)),
            invalid: Arc::new(AtomicU64::new(0)),
            not_configured: Arc::new(AtomicU64::new(0)),
            upstream_rejected: Arc::new(AtomicU64::new(0)),
            upstream_errors: Arc::new(AtomicU64::new(0)),
            internal_errors: Arc::new(AtomicU64::new(0)),
            last_relayed_at: Arc::new(RwLock::new(None)),
            start_time: Utc::now(),
        }
    }

    pub fn record(&self, outcome: Outcome) {
        self.total_submissions.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Outcome::Relayed => {
                *self.last_relayed_at.write() = Some(Utc::now());
                &self.relayed
            }
            Outcome::Invalid => &self.invalid,
            Outcome::NotConfigured => &self.not_configured,
            Outcome::UpstreamRejected => &self.upstream_rejected,
            Outcome::UpstreamError => &self.upstream_errors,
            Outcome::Internal => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.start_time).num_seconds()
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let total = self.total_submissions.load(Ordering::Relaxed);
        let relayed = self.relayed.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_submissions: total,
            relayed,
            invalid: self.invalid.load(Ordering::Relaxed),
            not_configured: self.not_configured.load(Ordering::Relaxed),
            upstream_rejected: self.upstream_rejected.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            failure_rate: if total > 0 {
                ((total - relayed) as f64 / total as f64) * 100.0
            } else {
                0.0
            },
            last_relayed_at: *self.last_relayed_at.read(),
            uptime_seconds: self.uptime_seconds(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
