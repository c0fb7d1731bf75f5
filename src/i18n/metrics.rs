//! Resource loading metrics.
//!
//! Each engine keeps its own counters for bundle loads and catalog fetches,
//! so several contexts in one process do not share numbers.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct LoadMetrics {
    /// Bundles loaded successfully
    bundle_loads: AtomicUsize,

    /// Bundles that failed to load
    bundle_failures: AtomicUsize,

    /// Catalog fetches attempted
    catalog_fetches: AtomicUsize,

    /// Catalog fetches that failed
    catalog_failures: AtomicUsize,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bundle_load(&self) {
        self.bundle_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bundle_failure(&self) {
        self.bundle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_catalog_fetch(&self) {
        self.catalog_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_catalog_failure(&self) {
        self.catalog_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bundle_loads(&self) -> usize {
        self.bundle_loads.load(Ordering::Relaxed)
    }

    pub fn bundle_failures(&self) -> usize {
        self.bundle_failures.load(Ordering::Relaxed)
    }

    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::Relaxed)
    }

    pub fn catalog_failures(&self) -> usize {
        self.catalog_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of the current counters.
    pub fn report(&self) -> MetricsReport {
        let loads = self.bundle_loads();
        let failures = self.bundle_failures();
        let attempts = loads + failures;
        let bundle_success_rate = if attempts > 0 {
            (loads as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            bundle_loads: loads,
            bundle_failures: failures,
            bundle_success_rate,
            catalog_fetches: self.catalog_fetches(),
            catalog_failures: self.catalog_failures(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub bundle_loads: usize,
    pub bundle_failures: usize,

    /// Successful bundle loads as a percentage of attempts (0-100)
    pub bundle_success_rate: f64,

    pub catalog_fetches: usize,
    pub catalog_failures: usize,
}
