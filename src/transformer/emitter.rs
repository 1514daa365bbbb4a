//! Sansay record to metric sample conversion

use std::sync::OnceLock;

use regex::Regex;

use super::metric::{MetricSample, MetricSink};
use super::schema::{
    translate_realtime_row, translate_trunk_row, TableKind, Trunk, TrunkField,
    EXCLUDED_SYSTEM_FIELDS, REALTIME_FIELDS, RESOURCE_FIELDS,
};
use crate::collector::{Decoded, Field, MediaServerRecord, ResourceConfigRecord, TabularDump};
use crate::error::EmitError;

const TRUNK_PREFIX: &str = "sansay_trunk_";
const SYSTEM_PREFIX: &str = "sansay_";

/// Parse a field value as a gauge value
pub fn parse_value(metric: &str, value: &str) -> Result<f64, EmitError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| EmitError::InvalidNumber {
            metric: metric.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn validate_metric_name(name: &str) -> Result<(), EmitError> {
    static METRIC_NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = METRIC_NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("invalid metric name regex")
    });

    if re.is_match(name) {
        Ok(())
    } else {
        Err(EmitError::InvalidMetricName(name.to_string()))
    }
}

/// Emit the requested slots of a trunk record
///
/// Direction-tagged records get a `direction` label. For the
/// `<window>_calls_<status>` family the status moves into a `status` label and
/// is cut from the name, so attempts, answers and failures of one window share
/// a single metric.
pub fn emit_trunk(trunk: &Trunk, fields: &[TrunkField]) -> Vec<Result<MetricSample, EmitError>> {
    fields
        .iter()
        .map(|field| {
            let base_name = field.name().to_lowercase();
            let mut name = format!("{}{}", TRUNK_PREFIX, base_name);
            let value = parse_value(&name, trunk.get(*field))?;

            let mut labels = vec![
                ("trunkgroup".to_string(), trunk.trunk_id().to_string()),
                ("alias".to_string(), trunk.alias().to_string()),
            ];

            if !trunk.direction().is_empty() {
                labels.push(("direction".to_string(), trunk.direction().to_string()));

                let segments: Vec<&str> = base_name.split('_').collect();
                if segments.get(1) == Some(&"calls") {
                    if let Some(status) = segments.get(2) {
                        labels.push(("status".to_string(), status.to_string()));
                        if let Some(pos) = name.rfind('_') {
                            name.truncate(pos);
                        }
                    }
                }
            }

            let mut sample = MetricSample::gauge(name, value);
            sample.labels = labels;
            Ok(sample)
        })
        .collect()
}

/// Emit one `system_stat` row as flat `sansay_<field>` gauges
pub fn emit_system_stat(fields: &[Field]) -> Vec<Result<MetricSample, EmitError>> {
    fields
        .iter()
        .filter(|f| !EXCLUDED_SYSTEM_FIELDS.contains(&f.name.as_str()))
        .map(|f| {
            let name = format!("{}{}", SYSTEM_PREFIX, f.name);
            validate_metric_name(&name)?;
            let value = parse_value(&name, &f.value)?;
            Ok(MetricSample::gauge(name, value))
        })
        .collect()
}

/// Media server kind: last word of the switch type, after its last `-`
pub fn media_server_type(switch_type: &str) -> &str {
    let word = switch_type.rsplit(' ').next().unwrap_or(switch_type);
    match word.rfind('-') {
        Some(pos) if pos > 0 => &word[pos + 1..],
        _ => word,
    }
}

/// Emit the status, capacity and session gauges of one media server
pub fn emit_media_server(server: &MediaServerRecord) -> Vec<Result<MetricSample, EmitError>> {
    let server_type = media_server_type(&server.switch_type);
    let status = if server.status == "up" { "1" } else { "0" };

    [
        ("sansay_mediaserver_up", status),
        ("sansay_mediaserver_sessions_limit", server.max_connections.as_str()),
        ("sansay_mediaserver_sessions", server.active_sessions.as_str()),
    ]
    .into_iter()
    .map(|(name, raw)| {
        let value = parse_value(name, raw)?;
        Ok(MetricSample::gauge(name, value)
            .with_label("server", server.alias.as_str())
            .with_label("server_ip", server.public_ip.as_str())
            .with_label("type", server_type))
    })
    .collect()
}

/// Emit the configured session and CPS ceilings of one trunk group
pub fn emit_resource_config(
    resource: &ResourceConfigRecord,
) -> Vec<Result<MetricSample, EmitError>> {
    [
        ("sansay_config_trunk_sessions_max", resource.capacity.as_str()),
        ("sansay_config_trunk_cps_max", resource.cps_limit.as_str()),
    ]
    .into_iter()
    .map(|(name, raw)| {
        let value = parse_value(name, raw)?;
        Ok(MetricSample::gauge(name, value)
            .with_label("trunkgroup", resource.trunk_id.as_str())
            .with_label("alias", resource.alias.as_str()))
    })
    .collect()
}

/// Emit every interpreted table of a dump
pub fn emit_dump(source: &str, dump: &TabularDump, sink: &mut MetricSink) {
    for table in &dump.database.tables {
        match TableKind::from_name(&table.name) {
            TableKind::SystemStat => {
                for row in &table.rows {
                    sink.record(source, emit_system_stat(&row.fields));
                }
            }
            TableKind::RealtimeTrunks => {
                for row in &table.rows {
                    let trunk = translate_realtime_row(row);
                    if trunk.is_group() {
                        sink.record(source, emit_trunk(&trunk, &REALTIME_FIELDS));
                    }
                }
            }
            TableKind::Trunks(direction) => {
                for row in &table.rows {
                    let trunk = translate_trunk_row(row, direction);
                    sink.record(source, emit_trunk(&trunk, &RESOURCE_FIELDS));
                }
            }
            TableKind::Ignored => {
                tracing::trace!(table = %table.name, "Ignoring table");
            }
        }
    }
}

/// Emit a decoded resource into the sink
pub fn emit_decoded(source: &str, decoded: &Decoded, sink: &mut MetricSink) {
    match decoded {
        Decoded::Tabular(dump) => emit_dump(source, dump, sink),
        Decoded::MediaServers(servers) => {
            for server in servers {
                sink.record(source, emit_media_server(server));
            }
        }
        Decoded::ResourceConfigs(resources) => {
            for resource in resources {
                sink.record(source, emit_resource_config(resource));
            }
        }
    }
}
