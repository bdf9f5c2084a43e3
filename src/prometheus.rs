//! Metrics query aggregation.
//!
//! Issues the four dashboard gauge queries through the backend's Prometheus
//! proxy concurrently and reduces each instant-vector result to one scalar.
//!
//! # Outcome
//!
//! - any query fails (transport, HTTP status, undecodable body): the whole
//!   batch is [`MetricsOutcome::Failed`]
//! - every query answers without a usable sample: [`MetricsOutcome::NoRecentSamples`]
//! - otherwise: [`MetricsOutcome::Samples`], with individual gaps left absent

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::Result;
use crate::model::{MetricReadings, MetricsOutcome};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One dashboard gauge backed by a fixed PromQL expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricQuery {
    WriteLatencyP95,
    ReadThroughput,
    Iops,
    LockContentionP95,
}

impl MetricQuery {
    /// All gauges, in display order.
    pub fn all() -> [MetricQuery; 4] {
        [
            MetricQuery::WriteLatencyP95,
            MetricQuery::ReadThroughput,
            MetricQuery::Iops,
            MetricQuery::LockContentionP95,
        ]
    }

    /// PromQL expression sent to the proxy.
    pub fn expr(&self) -> &'static str {
        match self {
            MetricQuery::WriteLatencyP95 => {
                "histogram_quantile(0.95, sum(rate(pfs_write_latency_seconds_bucket[5m])) by (le))"
            }
            MetricQuery::ReadThroughput => "sum(rate(pfs_read_throughput_bytes[5m]))",
            MetricQuery::Iops => "sum(rate(pfs_iops_total[5m]))",
            MetricQuery::LockContentionP95 => {
                "histogram_quantile(0.95, sum(rate(pfs_mds_lock_contention_seconds_bucket[5m])) by (le))"
            }
        }
    }

    /// Convert a raw sample into the display unit.
    pub fn convert(&self, raw: f64) -> f64 {
        match self {
            // seconds -> milliseconds
            MetricQuery::WriteLatencyP95 | MetricQuery::LockContentionP95 => raw * 1000.0,
            // bytes/s -> MB/s
            MetricQuery::ReadThroughput => raw / BYTES_PER_MIB,
            MetricQuery::Iops => raw,
        }
    }

    /// Display unit after conversion.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricQuery::WriteLatencyP95 | MetricQuery::LockContentionP95 => "ms",
            MetricQuery::ReadThroughput => "MB/s",
            MetricQuery::Iops => "ops/s",
        }
    }

    /// Panel label.
    pub fn label(&self) -> &'static str {
        match self {
            MetricQuery::WriteLatencyP95 => "Write p95",
            MetricQuery::ReadThroughput => "Read throughput",
            MetricQuery::Iops => "IOPS",
            MetricQuery::LockContentionP95 => "MDS lock p95",
        }
    }
}

/// Backend path for an instant query through the Prometheus proxy.
pub fn query_path(expr: &str) -> String {
    format!("/api/prometheus?expr={}", urlencoding::encode(expr))
}

/// Run one instant query through the proxy.
pub async fn query(backend: &dyn Backend, expr: &str) -> Result<Value> {
    backend.get_json(&query_path(expr)).await
}

/// First sample of an instant-vector response, if it is a finite number.
///
/// Expects `{ "data": { "result": [ { "value": [ts, "123.4"] } ] } }`.
pub fn first_sample(payload: &Value) -> Option<f64> {
    let first = payload
        .get("data")?
        .get("result")?
        .as_array()?
        .first()?;
    let raw = first.get("value")?.get(1)?;

    let value = match raw {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };

    value.is_finite().then_some(value)
}

/// Reduce four raw samples into readings, or `NoRecentSamples` when all are absent.
pub fn reduce(samples: [Option<f64>; 4]) -> MetricsOutcome {
    if samples.iter().all(Option::is_none) {
        return MetricsOutcome::NoRecentSamples;
    }

    let [write, read, iops, lock] = MetricQuery::all();
    let convert = |q: MetricQuery, raw: Option<f64>| raw.map(|v| q.convert(v)).filter(|v| v.is_finite());

    MetricsOutcome::Samples(MetricReadings {
        write_p95_ms: convert(write, samples[0]),
        read_throughput_mbps: convert(read, samples[1]),
        iops: convert(iops, samples[2]),
        lock_contention_p95_ms: convert(lock, samples[3]),
    })
}

/// Issue all four gauge queries concurrently and aggregate the results.
pub async fn aggregate(backend: &dyn Backend) -> MetricsOutcome {
    let [write, read, iops, lock] = MetricQuery::all();

    let batch = tokio::try_join!(
        query(backend, write.expr()),
        query(backend, read.expr()),
        query(backend, iops.expr()),
        query(backend, lock.expr()),
    );

    match batch {
        Ok((w, r, i, l)) => {
            let samples = [first_sample(&w), first_sample(&r), first_sample(&i), first_sample(&l)];
            debug!(?samples, "prometheus samples");
            reduce(samples)
        }
        Err(e) => {
            warn!("Prometheus query batch failed: {}", e);
            MetricsOutcome::Failed(e.to_string())
        }
    }
}
