//! Metric samples and the per-scrape sink

use std::collections::HashSet;
use std::fmt;

use crate::error::EmitError;

/// Name of the marker emitted for every scrape or field error
pub const ERROR_METRIC: &str = "sansay_error";

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    /// Point-in-time value
    #[default]
    Gauge,
    /// Monotonically increasing value
    Counter,
    /// Summary exposed as `_sum` and `_count` series
    Summary,
    /// Type is not specified
    Untyped,
}

impl MetricType {
    /// Returns the Prometheus type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }
}

/// A single metric sample ready for output
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Metric name
    pub name: String,
    /// Metric type
    pub metric_type: MetricType,
    /// Help text
    pub help: Option<String>,
    /// Labels, in emission order
    pub labels: Vec<(String, String)>,
    /// Metric value
    pub value: f64,
}

impl MetricSample {
    /// Create a new untyped sample
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Untyped,
            help: None,
            labels: Vec::new(),
            value,
        }
    }

    /// Create a gauge sample
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value).with_type(MetricType::Gauge)
    }

    /// Set the metric type
    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Append a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    /// Value of a label, if present
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Label keys in order
    pub fn label_keys(&self) -> Vec<&str> {
        self.labels.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Series identity, `name{k="v",...}`
    pub fn series_id(&self) -> String {
        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        format!("{}{{{}}}", self.name, labels.join(","))
    }
}

/// Diagnostic recorded instead of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarker {
    /// Resource path or metric the error belongs to
    pub source: String,
    /// Error message
    pub message: String,
}

/// Append-only output of one scrape
#[derive(Debug, Default)]
pub struct MetricSink {
    samples: Vec<MetricSample>,
    errors: Vec<ErrorMarker>,
    series: HashSet<String>,
}

impl MetricSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    ///
    /// A sample repeating the name and label set of an earlier one is refused,
    /// the first occurrence wins.
    pub fn push(&mut self, sample: MetricSample) -> Result<(), EmitError> {
        let id = sample.series_id();
        if !self.series.insert(id.clone()) {
            return Err(EmitError::DuplicateSeries(id));
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Append an error marker
    pub fn push_error(&mut self, source: impl Into<String>, error: &dyn fmt::Display) {
        self.errors.push(ErrorMarker {
            source: source.into(),
            message: error.to_string(),
        });
    }

    /// Append per-field emission results; each failure becomes one marker
    pub fn record<E>(
        &mut self,
        source: &str,
        results: impl IntoIterator<Item = Result<MetricSample, E>>,
    ) where
        E: fmt::Display,
    {
        for result in results {
            match result {
                Ok(sample) => {
                    if let Err(e) = self.push(sample) {
                        tracing::debug!(source = %source, error = %e, "Dropping duplicate metric");
                        self.push_error(source, &e);
                    }
                }
                Err(e) => {
                    tracing::debug!(source = %source, error = %e, "Dropping invalid metric");
                    self.push_error(source, &e);
                }
            }
        }
    }

    /// Samples recorded so far
    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Error markers recorded so far
    pub fn errors(&self) -> &[ErrorMarker] {
        &self.errors
    }

    /// Samples with a given name
    pub fn samples_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetricSample> {
        self.samples.iter().filter(move |s| s.name == name)
    }

    /// Final metric list: samples followed by `sansay_error` markers
    ///
    /// Identical markers are merged into one series whose value is the number
    /// of occurrences, so the exposition never repeats a label set.
    pub fn into_metrics(self) -> Vec<MetricSample> {
        let mut metrics = self.samples;

        let mut merged: Vec<(ErrorMarker, u64)> = Vec::new();
        for marker in self.errors {
            match merged.iter_mut().find(|(m, _)| *m == marker) {
                Some((_, count)) => *count += 1,
                None => merged.push((marker, 1)),
            }
        }

        metrics.extend(merged.into_iter().map(|(marker, count)| {
            MetricSample::gauge(ERROR_METRIC, count as f64)
                .with_help("Error scraping target")
                .with_label("source", marker.source)
                .with_label("error", marker.message)
        }));

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmitError;

    #[test]
    fn test_sample_builder_keeps_label_order() {
        let sample = MetricSample::gauge("sansay_trunk_hour_calls", 1.0)
            .with_label("trunkgroup", "TG1")
            .with_label("alias", "")
            .with_label("direction", "ingress");
        assert_eq!(sample.label_keys(), vec!["trunkgroup", "alias", "direction"]);
        assert_eq!(sample.label("direction"), Some("ingress"));
        assert_eq!(sample.label("status"), None);
    }

    #[test]
    fn test_record_soft_fails_per_field() {
        let mut sink = MetricSink::new();
        sink.record(
            "stats/realtime",
            vec![
                Ok(MetricSample::gauge("a", 1.0)),
                Err(EmitError::InvalidMetricName("1bad".to_string())),
                Ok(MetricSample::gauge("b", 2.0)),
            ],
        );
        assert_eq!(sink.samples().len(), 2);
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(sink.errors()[0].source, "stats/realtime");
    }

    #[test]
    fn test_into_metrics_merges_identical_markers() {
        let mut sink = MetricSink::new();
        sink.push(MetricSample::gauge("sansay_x", 1.0)).unwrap();
        sink.push_error("stats/realtime", &"boom");
        sink.push_error("stats/realtime", &"boom");
        sink.push_error("stats/resource", &"boom");

        let metrics = sink.into_metrics();
        let errors: Vec<_> = metrics.iter().filter(|m| m.name == ERROR_METRIC).collect();
        assert_eq!(metrics.len(), 3);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].value, 2.0);
        assert_eq!(errors[1].label("source"), Some("stats/resource"));
    }

    #[test]
    fn test_duplicate_series_becomes_marker() {
        let sample = |value| {
            MetricSample::gauge("sansay_trunk_hour_calls", value)
                .with_label("trunkgroup", "TG1")
                .with_label("status", "attempt")
        };

        let mut sink = MetricSink::new();
        sink.record(
            "stats/resource",
            vec![Ok::<_, EmitError>(sample(5.0)), Ok(sample(6.0))],
        );

        let samples: Vec<_> = sink.samples_named("sansay_trunk_hour_calls").collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 5.0);
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(
            sink.errors()[0].message,
            "Duplicate series sansay_trunk_hour_calls{trunkgroup=\"TG1\",status=\"attempt\"}"
        );
    }

    #[test]
    fn test_same_name_different_labels_is_not_duplicate() {
        let sample = |label: &str, value| {
            MetricSample::gauge("sansay_x", value).with_label("a", label)
        };

        let mut sink = MetricSink::new();
        assert!(sink.push(sample("1", 1.0)).is_ok());
        assert!(sink.push(sample("2", 2.0)).is_ok());
        assert!(sink.push(sample("1", 3.0)).is_err());
        assert_eq!(sink.samples().len(), 2);
    }
}
