use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// In-process query counters, shared by all request tasks.
pub struct Metrics {
    total_queries: AtomicUsize,
    successful_queries: AtomicUsize,
    failed_queries: AtomicUsize,
    rejected_requests: AtomicUsize,

    // Timing (in microseconds)
    total_query_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_queries: AtomicUsize::new(0),
            successful_queries: AtomicUsize::new(0),
            failed_queries: AtomicUsize::new(0),
            rejected_requests: AtomicUsize::new(0),
            total_query_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_query(&self, success: bool, duration: Duration) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_queries.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        self.total_query_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// A request turned away before reaching the pipeline.
    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_queries.load(Ordering::Relaxed);
        let total_us = self.total_query_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_queries: total,
            successful_queries: self.successful_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            avg_query_time_ms: if total > 0 {
                total_us as f64 / total as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub rejected_requests: usize,
    pub avg_query_time_ms: f64,
}
