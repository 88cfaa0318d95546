use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct Metrics {
    catalog_requests: AtomicU64,
    free_form_requests: AtomicU64,
    denials: AtomicU64,
    executions: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
    empty_parses: AtomicU64,
    in_flight: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_catalog_requests(&self) {
        self.catalog_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_free_form_requests(&self) {
        self.free_form_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_denials(&self) {
        self.denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_executions(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_parses(&self) {
        self.empty_parses.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one running execution until the guard drops.
    pub fn track_in_flight(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard { metrics: self }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            catalog_requests: self.catalog_requests.load(Ordering::Relaxed),
            free_form_requests: self.free_form_requests.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            empty_parses: self.empty_parses.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            catalog_requests: AtomicU64::new(0),
            free_form_requests: AtomicU64::new(0),
            denials: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            empty_parses: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
        }
    }
}

pub struct InFlightGuard<'a> {
    metrics: &'a Metrics,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub catalog_requests: u64,
    pub free_form_requests: u64,
    pub denials: u64,
    pub executions: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub empty_parses: u64,
    pub in_flight: u64,
}

impl MetricsSnapshot {
    pub fn execution_success_rate(&self) -> f64 {
        if self.executions == 0 {
            return 1.0;
        }
        1.0 - ((self.timeouts + self.failures) as f64 / self.executions as f64)
    }

    pub fn denial_rate(&self) -> f64 {
        if self.free_form_requests == 0 {
            return 0.0;
        }
        self.denials as f64 / self.free_form_requests as f64
    }
}
