//! Canonical panel models.
//!
//! Everything the renderer consumes lives here. Models are rebuilt from
//! scratch on every poll cycle and never merged with a previous snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Cluster status as reported by `/api/status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub observability_health: String,
    /// Component name to status string. Sorted for stable display only.
    pub components: BTreeMap<String, String>,
    pub error: Option<String>,
    pub generated_at: Option<String>,
    /// Pod phase to pod count.
    pub phases: BTreeMap<String, u64>,
}

/// Known fault event statuses. Anything else is displayed unstyled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Ok,
    Warn,
    Error,
    Other,
}

impl EventSeverity {
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "ok" | "success" | "done" => EventSeverity::Ok,
            "warn" | "warning" | "pending" => EventSeverity::Warn,
            "error" | "failed" | "fail" => EventSeverity::Error,
            _ => EventSeverity::Other,
        }
    }
}

/// One entry of the fault-injection history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultEvent {
    pub action: String,
    /// Opaque, display-only.
    pub timestamp: String,
    pub status: String,
    pub detail: Option<String>,
}

impl FaultEvent {
    pub fn severity(&self) -> EventSeverity {
        EventSeverity::from_status(&self.status)
    }
}

/// Fault events in the order the backend sent them (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultTimeline {
    events: Vec<FaultEvent>,
}

impl FaultTimeline {
    pub fn new(events: Vec<FaultEvent>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Events as received.
    pub fn events(&self) -> &[FaultEvent] {
        &self.events
    }

    /// Most recent first, without touching the stored order.
    pub fn newest_first(&self) -> impl Iterator<Item = &FaultEvent> {
        self.events.iter().rev()
    }
}

/// Latest benchmark run summary.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkSummary {
    /// No run has been recorded yet.
    Unavailable,
    Available(BenchmarkRun),
}

/// Throughput and IOPS figures of one benchmark run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkRun {
    pub run_id: String,
    pub seq_read_mbps: Option<f64>,
    pub seq_write_mbps: Option<f64>,
    pub rand_read_iops: Option<f64>,
    pub rand_write_iops: Option<f64>,
    pub metadata_info: Option<String>,
    pub collected_at: Option<String>,
}

/// Remote configuration served by `/api/demo/config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub prometheus_url: String,
}

/// The four scalar gauges derived from Prometheus, already unit-converted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricReadings {
    pub write_p95_ms: Option<f64>,
    pub read_throughput_mbps: Option<f64>,
    pub iops: Option<f64>,
    pub lock_contention_p95_ms: Option<f64>,
}

impl MetricReadings {
    /// All four readings absent.
    pub const EMPTY: MetricReadings = MetricReadings {
        write_p95_ms: None,
        read_throughput_mbps: None,
        iops: None,
        lock_contention_p95_ms: None,
    };
}

/// Result of one metrics aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsOutcome {
    /// At least one query returned a sample.
    Samples(MetricReadings),
    /// Every query answered, none had a sample.
    NoRecentSamples,
    /// The batch failed as a whole.
    Failed(String),
}

/// Metrics panel content: the aggregation outcome plus the store it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsPanel {
    pub outcome: MetricsOutcome,
    pub prometheus_url: String,
}

impl MetricsPanel {
    /// Readings to display; all absent unless samples were found.
    pub fn readings(&self) -> MetricReadings {
        match &self.outcome {
            MetricsOutcome::Samples(readings) => *readings,
            MetricsOutcome::NoRecentSamples | MetricsOutcome::Failed(_) => MetricReadings::EMPTY,
        }
    }

    /// Guidance line shown under the gauges.
    pub fn hint(&self) -> String {
        match &self.outcome {
            MetricsOutcome::Samples(_) => {
                format!("Prometheus source: {}", self.prometheus_url)
            }
            MetricsOutcome::NoRecentSamples => {
                "Prometheus is reachable, but there are no recent samples yet. \
                 Run \"make seed-metrics N=20\" and refresh in 10-20 seconds."
                    .to_string()
            }
            MetricsOutcome::Failed(message) => format!(
                "Prometheus query failed ({}): {}. Port-forward the metrics store: \
                 kubectl -n kube-pfs-observability port-forward svc/kube-pfs-prometheus 9090:9090",
                self.prometheus_url, message
            ),
        }
    }
}

/// A panel's content, or the reason it could not be filled this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Ready(T),
    Failed(String),
}

impl<T> PanelState<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, PanelState::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            PanelState::Ready(value) => Some(value),
            PanelState::Failed(_) => None,
        }
    }
}

/// Everything rendered for one completed poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    /// Monotonic cycle number, starting at 1.
    pub cycle: u64,
    pub completed_at: DateTime<Utc>,
    pub status: PanelState<StatusSnapshot>,
    pub timeline: PanelState<FaultTimeline>,
    pub benchmark: PanelState<BenchmarkSummary>,
    pub metrics: MetricsPanel,
}

impl DashboardSnapshot {
    /// True when no source at all produced data this cycle.
    pub fn all_sources_failed(&self) -> bool {
        self.status.is_failed()
            && self.timeline.is_failed()
            && self.benchmark.is_failed()
            && matches!(self.metrics.outcome, MetricsOutcome::Failed(_))
    }
}
