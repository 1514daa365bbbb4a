//! Exporter self-metrics
//!
//! Process-wide state created once at startup and shared with every request
//! handler. Values only ever grow; nothing is reset during the process
//! lifetime.
//!
//! # Metrics
//!
//! - `sansay_collection_duration_seconds` - Summary of scrape request durations
//! - `sansay_request_errors_total` - Counter of malformed scrape requests
//! - `sansay_exporter_build_info{version="..."}` - Constant 1

use std::sync::atomic::{AtomicU64, Ordering};

use crate::transformer::{MetricSample, MetricType, PrometheusFormatter};

/// Thread-safe counter using atomic operations
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter initialized to 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Thread-safe summary without quantiles: sum and count of observations
#[derive(Debug)]
pub struct Summary {
    /// Stored as bits of f64 for atomic operations
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

impl Summary {
    pub fn new() -> Self {
        Self {
            sum: AtomicU64::new(0.0_f64.to_bits()),
            count: AtomicU64::new(0),
        }
    }

    /// Observe a value
    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);

        loop {
            let current = self.sum.load(Ordering::Relaxed);
            let new = f64::from_bits(current) + v;
            if self
                .sum
                .compare_exchange_weak(current, new.to_bits(), Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Get the sum of all observations
    pub fn get_sum(&self) -> f64 {
        f64::from_bits(self.sum.load(Ordering::Relaxed))
    }

    /// Get the total count of observations
    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Self-metrics of the exporter process
#[derive(Debug, Default)]
pub struct ExporterMetrics {
    /// Duration of completed scrape requests
    pub collection_duration_seconds: Summary,
    /// Scrape requests rejected before any upstream call
    pub request_errors_total: Counter,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot as metric samples
    pub fn to_prometheus_metrics(&self) -> Vec<MetricSample> {
        let summary = &self.collection_duration_seconds;

        vec![
            MetricSample::new(
                "sansay_collection_duration_seconds_sum",
                summary.get_sum(),
            )
            .with_type(MetricType::Summary)
            .with_help("Duration of collections by the sansay exporter"),
            MetricSample::new(
                "sansay_collection_duration_seconds_count",
                summary.get_count() as f64,
            )
            .with_type(MetricType::Summary),
            MetricSample::new(
                "sansay_request_errors_total",
                self.request_errors_total.get() as f64,
            )
            .with_type(MetricType::Counter)
            .with_help("Errors in requests to the sansay exporter"),
            MetricSample::gauge("sansay_exporter_build_info", 1.0)
                .with_help("Build information of the Sansay exporter")
                .with_label("version", env!("CARGO_PKG_VERSION")),
        ]
    }

    /// Format self-metrics as Prometheus exposition format string
    pub fn format_prometheus(&self) -> String {
        PrometheusFormatter::new().format(&self.to_prometheus_metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_operations() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);

        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_summary_operations() {
        let summary = Summary::new();
        summary.observe(0.5);
        summary.observe(1.25);

        assert_eq!(summary.get_count(), 2);
        assert_eq!(summary.get_sum(), 1.75);
    }

    #[test]
    fn test_format_prometheus() {
        let metrics = ExporterMetrics::new();
        metrics.collection_duration_seconds.observe(0.5);
        metrics.request_errors_total.inc();

        let output = metrics.format_prometheus();

        assert!(output.contains("# TYPE sansay_collection_duration_seconds summary"));
        assert!(output.contains("sansay_collection_duration_seconds_sum 0.5"));
        assert!(output.contains("sansay_collection_duration_seconds_count 1"));
        assert!(output.contains("# TYPE sansay_request_errors_total counter"));
        assert!(output.contains("sansay_request_errors_total 1"));
        assert!(output.contains(&format!(
            "sansay_exporter_build_info{{version=\"{}\"}} 1",
            env!("CARGO_PKG_VERSION")
        )));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = ExporterMetrics::new();
        let b = ExporterMetrics::new();
        a.request_errors_total.inc();
        assert_eq!(b.request_errors_total.get(), 0);
    }
}
