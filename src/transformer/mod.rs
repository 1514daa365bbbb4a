//! Metric transformation module
//!
//! Turns decoded Sansay resources into Prometheus samples:
//!
//! - [`schema`] normalises trunk rows into the canonical [`Trunk`] record
//! - [`emitter`] derives metric names and labels and parses values
//! - [`metric`] holds samples and per-scrape error markers
//! - [`formatter`] renders the text exposition format

pub mod emitter;
pub mod formatter;
pub mod metric;
pub mod schema;

pub use emitter::{
    emit_decoded, emit_dump, emit_media_server, emit_resource_config, emit_system_stat,
    emit_trunk, media_server_type, parse_value,
};
pub use formatter::PrometheusFormatter;
pub use metric::{ErrorMarker, MetricSample, MetricSink, MetricType, ERROR_METRIC};
pub use schema::{
    canonical_name, translate_realtime_row, translate_trunk_row, Direction, TableKind, Trunk,
    TrunkField,
};
