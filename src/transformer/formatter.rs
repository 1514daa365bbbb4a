//! Prometheus Exposition Format output
//!
//! This module handles formatting of Prometheus metrics into the text
//! exposition format (version 0.0.4).
//!
//! # Format Specification
//!
//! ```text
//! # HELP <metric_name> <help_text>
//! # TYPE <metric_name> <type>
//! <metric_name>{<label1>="<value1>",<label2>="<value2>"} <value>
//! ```

use std::collections::HashMap;

use super::metric::{MetricSample, MetricType};

/// Prometheus exposition format formatter
///
/// Formats `MetricSample` instances into the Prometheus text format. Label
/// order is kept as emitted.
///
/// # Example
///
/// ```ignore
/// use sansay_exporter::transformer::{MetricSample, PrometheusFormatter};
///
/// let metrics = vec![
///     MetricSample::gauge("sansay_trunk_numorig", 12.0)
///         .with_label("trunkgroup", "100")
///         .with_label("alias", "Carrier A"),
/// ];
///
/// let output = PrometheusFormatter::new().format(&metrics);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrometheusFormatter;

impl PrometheusFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Format metrics into Prometheus exposition format
    ///
    /// # Notes
    ///
    /// - HELP and TYPE lines are emitted once per metric family
    /// - `_sum` and `_count` series of a summary share one family
    /// - Metrics of the same family are grouped together, in order of first
    ///   occurrence
    pub fn format(&self, metrics: &[MetricSample]) -> String {
        if metrics.is_empty() {
            return String::new();
        }

        let mut output = String::with_capacity(metrics.len() * 100);

        for (family, group) in Self::group_by_family(metrics) {
            if let Some(help) = group.iter().find_map(|m| m.help.as_deref()) {
                output.push_str(&format!("# HELP {} {}\n", family, Self::escape_help(help)));
            }

            output.push_str(&format!(
                "# TYPE {} {}\n",
                family,
                group[0].metric_type.as_str()
            ));

            for metric in group {
                output.push_str(&Self::format_metric_line(metric));
                output.push('\n');
            }
        }

        output
    }

    /// Family name: summaries drop their `_sum` / `_count` suffix
    fn family_name(metric: &MetricSample) -> &str {
        if metric.metric_type == MetricType::Summary {
            for suffix in ["_sum", "_count"] {
                if let Some(base) = metric.name.strip_suffix(suffix) {
                    return base;
                }
            }
        }
        &metric.name
    }

    /// Group metrics by family, preserving order of first occurrence
    fn group_by_family(metrics: &[MetricSample]) -> Vec<(String, Vec<&MetricSample>)> {
        let mut groups: HashMap<&str, Vec<&MetricSample>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for metric in metrics {
            let family = Self::family_name(metric);
            if !groups.contains_key(family) {
                order.push(family);
            }
            groups.entry(family).or_default().push(metric);
        }

        order
            .into_iter()
            .filter_map(|name| groups.remove(name).map(|g| (name.to_string(), g)))
            .collect()
    }

    /// Format a single metric line
    fn format_metric_line(metric: &MetricSample) -> String {
        let mut line = metric.name.clone();

        if !metric.labels.is_empty() {
            let label_pairs: Vec<String> = metric
                .labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, Self::escape_label_value(v)))
                .collect();

            line.push('{');
            line.push_str(&label_pairs.join(","));
            line.push('}');
        }

        line.push(' ');
        line.push_str(&Self::format_value(metric.value));

        line
    }

    /// Format a numeric value for Prometheus
    ///
    /// - NaN → "NaN"
    /// - +Inf → "+Inf"
    /// - -Inf → "-Inf"
    /// - Integers are formatted without decimal point
    /// - Large/small floats use scientific notation
    fn format_value(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "+Inf".to_string()
            } else {
                "-Inf".to_string()
            }
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            // Format as integer if no fractional part and not too large
            format!("{}", value as i64)
        } else if value.abs() >= 1e6 || (value.abs() < 1e-3 && value != 0.0) {
            // Use scientific notation for very large or very small numbers
            format!("{:e}", value)
        } else {
            // Standard decimal format
            format!("{}", value)
        }
    }

    /// Escape help text
    ///
    /// Escapes backslash and newline characters.
    fn escape_help(help: &str) -> String {
        help.replace('\\', "\\\\").replace('\n', "\\n")
    }

    /// Escape label value
    ///
    /// Escapes backslash, double-quote, and newline characters.
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}
