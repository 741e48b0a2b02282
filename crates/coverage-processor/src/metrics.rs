//! GetCoverage metrics collection and reporting.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;
use wcs_common::ExceptionCode;

/// Metrics collector for the coverage service.
#[derive(Debug)]
pub struct CoverageMetrics {
    /// Request counts
    pub requests: AtomicU64,
    pub invalid_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub reads: AtomicU64,

    /// Timing stats (stored as microseconds)
    request_times: RwLock<TimingStats>,
    read_times: RwLock<TimingStats>,
    pipeline_times: RwLock<TimingStats>,

    /// Start time for uptime calculation
    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn snapshot(&self) -> TimingSnapshot {
        TimingSnapshot {
            count: self.count,
            avg_ms: if self.count == 0 {
                0.0
            } else {
                (self.total_us as f64 / self.count as f64) / 1000.0
            },
            min_ms: self.min_us as f64 / 1000.0,
            max_ms: self.max_us as f64 / 1000.0,
        }
    }
}

impl Default for CoverageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            request_times: RwLock::new(TimingStats::default()),
            read_times: RwLock::new(TimingStats::default()),
            pipeline_times: RwLock::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Record a GetCoverage request and its outcome
    pub async fn record_request(&self, duration_us: u64, error: Option<ExceptionCode>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("wcs_getcoverage_requests_total").increment(1);
        histogram!("wcs_getcoverage_duration_seconds").record(duration_us as f64 / 1_000_000.0);

        match error {
            Some(ExceptionCode::InvalidParameterValue) => {
                self.invalid_requests.fetch_add(1, Ordering::Relaxed);
            }
            Some(ExceptionCode::NoApplicableCode) => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
        if let Some(code) = error {
            counter!("wcs_getcoverage_errors_total", "code" => code.as_str()).increment(1);
        }

        let mut times = self.request_times.write().await;
        times.record(duration_us);
    }

    /// Record a coverage read
    pub async fn record_read(&self, duration_us: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        counter!("wcs_coverage_reads_total").increment(1);
        histogram!("wcs_coverage_read_duration_ms").record(duration_us as f64 / 1000.0);

        let mut times = self.read_times.write().await;
        times.record(duration_us);
    }

    /// Record resampling pipeline time
    pub async fn record_pipeline(&self, duration_us: u64) {
        histogram!("wcs_resample_duration_ms").record(duration_us as f64 / 1000.0);

        let mut times = self.pipeline_times.write().await;
        times.record(duration_us);
    }

    /// Get a snapshot of current metrics
    pub async fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            request_times: self.request_times.read().await.snapshot(),
            read_times: self.read_times.read().await.snapshot(),
            pipeline_times: self.pipeline_times.read().await.snapshot(),
        }
    }
}

/// Serializable snapshot of timing stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSnapshot {
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Serializable snapshot of all metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub invalid_requests: u64,
    pub failed_requests: u64,
    pub reads: u64,
    pub request_times: TimingSnapshot,
    pub read_times: TimingSnapshot,
    pub pipeline_times: TimingSnapshot,
}
