//! Response normalizers.
//!
//! One adapter per backend source, each turning a raw JSON payload into its
//! canonical panel model. Adapters are total: unexpected shapes degrade to
//! defaults or absence, never to an error.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::{BenchmarkRun, BenchmarkSummary, DemoConfig, FaultEvent, FaultTimeline, StatusSnapshot};

/// Health string used when the backend does not report one.
const UNKNOWN_HEALTH: &str = "unknown";

/// Normalize a `/api/status` payload.
pub fn status(raw: &Value) -> StatusSnapshot {
    let Some(obj) = raw.as_object() else {
        return StatusSnapshot {
            observability_health: UNKNOWN_HEALTH.to_string(),
            ..StatusSnapshot::default()
        };
    };

    let components = obj
        .get("components")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(name, status)| scalar_string(status).map(|s| (name.clone(), s)))
                .collect()
        })
        .unwrap_or_default();

    let phases = obj
        .get("phases")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(phase, count)| count.as_u64().map(|n| (phase.clone(), n)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    StatusSnapshot {
        connected: obj.get("connected").and_then(Value::as_bool).unwrap_or(false),
        observability_health: non_empty_string(obj, "observabilityHealth")
            .unwrap_or_else(|| UNKNOWN_HEALTH.to_string()),
        components,
        error: non_empty_string(obj, "error"),
        generated_at: non_empty_string(obj, "generatedAt"),
        phases,
    }
}

/// Normalize a `/api/faults` payload.
pub fn timeline(raw: &Value) -> FaultTimeline {
    let events = raw
        .get("events")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(fault_event)
                .collect()
        })
        .unwrap_or_default();

    FaultTimeline::new(events)
}

fn fault_event(obj: &Map<String, Value>) -> FaultEvent {
    FaultEvent {
        action: string_field(obj, "action"),
        timestamp: string_field(obj, "timestamp"),
        status: string_field(obj, "status"),
        detail: non_empty_string(obj, "detail"),
    }
}

/// Normalize a `/api/benchmarks/latest` payload.
pub fn benchmark(raw: &Value) -> BenchmarkSummary {
    let available = raw.get("available").and_then(Value::as_bool).unwrap_or(false);
    let summary = raw.get("summary").and_then(Value::as_object);

    match (available, summary) {
        (true, Some(s)) => BenchmarkSummary::Available(BenchmarkRun {
            run_id: string_field(s, "runId"),
            seq_read_mbps: finite_field(s, "seqReadMBps"),
            seq_write_mbps: finite_field(s, "seqWriteMBps"),
            rand_read_iops: finite_field(s, "randReadIops"),
            rand_write_iops: finite_field(s, "randWriteIops"),
            metadata_info: non_empty_string(s, "metadataInfo"),
            collected_at: non_empty_string(s, "collectedAt"),
        }),
        _ => BenchmarkSummary::Unavailable,
    }
}

/// Normalize a `/api/demo/config` payload, falling back to `fallback_url`
/// when no usable Prometheus URL is present.
pub fn demo_config(raw: &Value, fallback_url: &str) -> DemoConfig {
    let prometheus_url = raw
        .get("prometheusURL")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(fallback_url)
        .trim_end_matches('/')
        .to_string();

    DemoConfig { prometheus_url }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).and_then(scalar_string).unwrap_or_default()
}

fn non_empty_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(scalar_string)
        .filter(|s| !s.trim().is_empty())
}

/// Strings as-is; numbers and booleans stringified; everything else absent.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn finite_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}
