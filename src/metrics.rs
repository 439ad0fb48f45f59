//! Observability metrics: operation counters and query latency.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of most recent query latencies kept for percentile estimates.
const LATENCY_WINDOW: usize = 4096;

/// Collects runtime metrics for a store. Safe to update from many threads.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    query_latencies_us: Mutex<VecDeque<f64>>,
    total_queries: AtomicU64,
    total_inserts: AtomicU64,
    total_removes: AtomicU64,
    total_compactions: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query with its duration.
    pub fn record_query(&self, duration: Duration) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let mut latencies = self.query_latencies_us.lock();
        if latencies.len() == LATENCY_WINDOW {
            latencies.pop_front();
        }
        latencies.push_back(duration.as_secs_f64() * 1e6);
    }

    pub fn record_insert(&self) {
        self.total_inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.total_removes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compaction(&self) {
        self.total_compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    pub fn total_inserts(&self) -> u64 {
        self.total_inserts.load(Ordering::Relaxed)
    }

    pub fn total_removes(&self) -> u64 {
        self.total_removes.load(Ordering::Relaxed)
    }

    pub fn total_compactions(&self) -> u64 {
        self.total_compactions.load(Ordering::Relaxed)
    }

    /// Average query latency in microseconds over the recent window.
    pub fn avg_query_latency_us(&self) -> f64 {
        let latencies = self.query_latencies_us.lock();
        if latencies.is_empty() {
            return 0.0;
        }
        latencies.iter().sum::<f64>() / latencies.len() as f64
    }

    /// Get a percentile of query latency (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_query_latency_us(&self, percentile: f64) -> f64 {
        let mut sorted: Vec<f64> = self.query_latencies_us.lock().iter().copied().collect();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_by(f64::total_cmp);

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}
