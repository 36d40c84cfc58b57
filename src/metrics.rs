//! Operational counters and latency statistics for the prediction service.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Processing times kept for percentile calculation
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the prediction service
pub struct ServiceMetrics {
    /// Verdicts produced
    pub predictions: AtomicU64,
    /// Verdicts that asked for maintenance
    pub maintenance_required: AtomicU64,
    /// Readings rejected by validation
    pub rejected_readings: AtomicU64,
    /// Requests that failed inside the classifier
    pub inference_failures: AtomicU64,
    /// Verdicts that could not be written to the log
    pub log_failures: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            maintenance_required: AtomicU64::new(0),
            rejected_readings: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            log_failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a produced verdict
    pub fn record_prediction(&self, processing_time: Duration, maintenance_required: bool) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if maintenance_required {
            self.maintenance_required.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    pub fn record_rejection(&self) {
        self.rejected_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_failure(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(poisoned) => poisoned.into_inner(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Seconds since the collector was created
    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            predictions: self.predictions.load(Ordering::Relaxed),
            maintenance_required: self.maintenance_required.load(Ordering::Relaxed),
            rejected_readings: self.rejected_readings.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            log_failures: self.log_failures.load(Ordering::Relaxed),
            processing: self.processing_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let required_rate = if snapshot.predictions > 0 {
            (snapshot.maintenance_required as f64 / snapshot.predictions as f64) * 100.0
        } else {
            0.0
        };
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              MACHINEGUARD - PREDICTION SUMMARY               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions:          {:>8}  │  Uptime: {:>10.0} s       ║",
            snapshot.predictions, snapshot.uptime_secs
        );
        info!(
            "║ Maintenance Required: {:>8}  │  Rate: {:>6.1}%              ║",
            snapshot.maintenance_required, required_rate
        );
        info!(
            "║ Rejected: {:>6}  Inference Failures: {:>6}  Log Failures: {:>6} ║",
            snapshot.rejected_readings, snapshot.inference_failures, snapshot.log_failures
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of [`ServiceMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub predictions: u64,
    pub maintenance_required: u64,
    pub rejected_readings: u64,
    pub inference_failures: u64,
    pub log_failures: u64,
    pub processing: ProcessingStats,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
