//! Panel text for a dashboard snapshot.
//!
//! Pure functions from the canonical models to display lines. The terminal
//! renderer styles them by [`Tone`]; `--once` mode prints them as plain text.

use std::fmt::Write as _;

use crate::format::{format_number, format_with_unit};
use crate::model::{
    BenchmarkSummary, DashboardSnapshot, EventSeverity, FaultTimeline, MetricsOutcome, MetricsPanel,
    PanelState, StatusSnapshot,
};
use crate::prometheus::MetricQuery;

/// Shown in the timeline panel when the backend has no events.
pub const EMPTY_TIMELINE: &str = "No fault events recorded yet.";

/// Visual emphasis of a display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Muted,
    Good,
    Warn,
    Bad,
    Strong,
}

impl From<EventSeverity> for Tone {
    fn from(severity: EventSeverity) -> Self {
        match severity {
            EventSeverity::Ok => Tone::Good,
            EventSeverity::Warn => Tone::Warn,
            EventSeverity::Error => Tone::Bad,
            EventSeverity::Other => Tone::Plain,
        }
    }
}

/// One line of panel content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub text: String,
    pub tone: Tone,
}

impl ViewLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }

    pub fn muted(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Muted)
    }
}

fn failed(message: &str) -> Vec<ViewLine> {
    vec![ViewLine::new(message, Tone::Bad)]
}

/// Cluster connectivity, observability health and component map.
pub fn status_lines(panel: &PanelState<StatusSnapshot>) -> Vec<ViewLine> {
    let status = match panel {
        PanelState::Ready(status) => status,
        PanelState::Failed(message) => return failed(message),
    };

    let mut lines = Vec::with_capacity(status.components.len() + 4);
    lines.push(if status.connected {
        ViewLine::new("Connected to Kubernetes", Tone::Good)
    } else {
        ViewLine::new("Cluster not connected", Tone::Bad)
    });
    lines.push(ViewLine::plain(format!(
        "Observability: {}",
        status.observability_health
    )));

    if let Some(error) = &status.error {
        lines.push(ViewLine::new(format!("Status error: {error}"), Tone::Bad));
    } else if status.components.is_empty() {
        lines.push(ViewLine::muted("No component status available yet."));
    }

    for (name, component_status) in &status.components {
        lines.push(ViewLine::plain(format!("{name}: {component_status}")));
    }

    if !status.phases.is_empty() {
        let phases: Vec<String> = status
            .phases
            .iter()
            .map(|(phase, count)| format!("{phase} {count}"))
            .collect();
        lines.push(ViewLine::muted(format!("Pods: {}", phases.join(", "))));
    }

    if let Some(generated_at) = &status.generated_at {
        lines.push(ViewLine::muted(format!("Generated at {generated_at}")));
    }

    lines
}

/// Fault events, most recent first.
pub fn timeline_lines(panel: &PanelState<FaultTimeline>) -> Vec<ViewLine> {
    let timeline = match panel {
        PanelState::Ready(timeline) => timeline,
        PanelState::Failed(message) => return failed(message),
    };

    if timeline.is_empty() {
        return vec![ViewLine::muted(EMPTY_TIMELINE)];
    }

    let mut lines = Vec::with_capacity(timeline.len() * 3);
    for event in timeline.newest_first() {
        lines.push(ViewLine::new(
            format!("{} [{}]", event.action, event.status),
            Tone::from(event.severity()),
        ));
        lines.push(ViewLine::muted(format!("  {}", event.timestamp)));
        if let Some(detail) = &event.detail {
            lines.push(ViewLine::muted(format!("  {detail}")));
        }
    }
    lines
}

/// Latest benchmark run.
pub fn benchmark_lines(panel: &PanelState<BenchmarkSummary>) -> Vec<ViewLine> {
    let summary = match panel {
        PanelState::Ready(summary) => summary,
        PanelState::Failed(message) => return failed(message),
    };

    let run = match summary {
        BenchmarkSummary::Available(run) => run,
        BenchmarkSummary::Unavailable => {
            return vec![
                ViewLine::new("No benchmark run found yet.", Tone::Strong),
                ViewLine::plain(format!("Seq read (MB/s): {}", format_number(None))),
                ViewLine::plain(format!("Seq write (MB/s): {}", format_number(None))),
                ViewLine::plain(format!("Rand read (IOPS): {}", format_number(None))),
                ViewLine::plain(format!("Rand write (IOPS): {}", format_number(None))),
                ViewLine::muted("Run make benchmark to generate live results."),
            ];
        }
    };

    let mut lines = vec![
        ViewLine::new(format!("Latest run: {}", run.run_id), Tone::Strong),
        ViewLine::plain(format!("Seq read (MB/s): {}", format_number(run.seq_read_mbps))),
        ViewLine::plain(format!("Seq write (MB/s): {}", format_number(run.seq_write_mbps))),
        ViewLine::plain(format!("Rand read (IOPS): {}", format_number(run.rand_read_iops))),
        ViewLine::plain(format!("Rand write (IOPS): {}", format_number(run.rand_write_iops))),
        ViewLine::muted(
            run.metadata_info
                .as_deref()
                .unwrap_or("No metadata benchmark info."),
        ),
    ];
    if let Some(collected_at) = &run.collected_at {
        lines.push(ViewLine::muted(format!("Collected at {collected_at}")));
    }
    lines
}

/// Gauge label and formatted value, in display order.
pub fn metric_values(panel: &MetricsPanel) -> Vec<(&'static str, String)> {
    let readings = panel.readings();
    let values = [
        readings.write_p95_ms,
        readings.read_throughput_mbps,
        readings.iops,
        readings.lock_contention_p95_ms,
    ];

    MetricQuery::all()
        .into_iter()
        .zip(values)
        .map(|(query, value)| (query.label(), format_with_unit(value, query.unit())))
        .collect()
}

/// The hint line under the gauges, toned by outcome.
pub fn metrics_hint(panel: &MetricsPanel) -> ViewLine {
    let tone = match panel.outcome {
        MetricsOutcome::Samples(_) => Tone::Muted,
        MetricsOutcome::NoRecentSamples => Tone::Warn,
        MetricsOutcome::Failed(_) => Tone::Bad,
    };
    ViewLine::new(panel.hint(), tone)
}

/// Gauges followed by the hint line.
pub fn metrics_lines(panel: &MetricsPanel) -> Vec<ViewLine> {
    let mut lines: Vec<ViewLine> = metric_values(panel)
        .into_iter()
        .map(|(label, value)| ViewLine::plain(format!("{label}: {value}")))
        .collect();
    lines.push(metrics_hint(panel));
    lines
}

/// External observability links.
pub fn link_lines(prometheus_url: &str, grafana_url: &str) -> Vec<ViewLine> {
    vec![
        ViewLine::plain(format!("Prometheus: {prometheus_url}")),
        ViewLine::plain(format!("Grafana: {grafana_url}")),
    ]
}

/// Plain-text rendering of every panel.
pub fn render_text(snapshot: &DashboardSnapshot, prometheus_url: &str, grafana_url: &str) -> String {
    let sections = [
        ("Cluster", status_lines(&snapshot.status)),
        ("Fault timeline", timeline_lines(&snapshot.timeline)),
        ("Benchmark", benchmark_lines(&snapshot.benchmark)),
        ("Live metrics", metrics_lines(&snapshot.metrics)),
        ("Links", link_lines(prometheus_url, grafana_url)),
    ];

    let mut out = String::new();
    let _ = writeln!(
        out,
        "kube-pfs dashboard (cycle {}, {})",
        snapshot.cycle,
        snapshot.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (title, lines) in sections {
        let _ = writeln!(out, "\n== {title} ==");
        for line in lines {
            let _ = writeln!(out, "{}", line.text);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{BenchmarkRun, FaultEvent, MetricReadings};
    use chrono::{TimeZone, Utc};

    fn texts(lines: &[ViewLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    fn status() -> StatusSnapshot {
        let mut status = StatusSnapshot {
            connected: true,
            observability_health: "healthy".to_string(),
            ..StatusSnapshot::default()
        };
        status.components.insert("mds".to_string(), "Running".to_string());
        status.components.insert("ost-0".to_string(), "Degraded".to_string());
        status
    }

    #[test]
    fn test_status_lines_connected() {
        let lines = status_lines(&PanelState::Ready(status()));
        assert_eq!(
            texts(&lines),
            vec!["Connected to Kubernetes", "Observability: healthy", "mds: Running", "ost-0: Degraded"]
        );
        assert_eq!(lines[0].tone, Tone::Good);
    }

    #[test]
    fn test_status_lines_disconnected_with_error() {
        let snapshot = StatusSnapshot {
            connected: false,
            observability_health: "unknown".to_string(),
            error: Some("kubectl not found".to_string()),
            generated_at: Some("2024-05-01T10:00:00Z".to_string()),
            ..StatusSnapshot::default()
        };
        let lines = status_lines(&PanelState::Ready(snapshot));
        assert_eq!(
            texts(&lines),
            vec![
                "Cluster not connected",
                "Observability: unknown",
                "Status error: kubectl not found",
                "Generated at 2024-05-01T10:00:00Z",
            ]
        );
    }

    #[test]
    fn test_status_lines_no_components() {
        let snapshot = StatusSnapshot {
            connected: true,
            observability_health: "degraded".to_string(),
            ..StatusSnapshot::default()
        };
        let lines = status_lines(&PanelState::Ready(snapshot));
        assert!(texts(&lines).contains(&"No component status available yet."));
    }

    #[test]
    fn test_status_lines_phases() {
        let mut snapshot = status();
        snapshot.phases.insert("Running".to_string(), 4);
        snapshot.phases.insert("Pending".to_string(), 1);
        let lines = status_lines(&PanelState::Ready(snapshot));
        assert!(texts(&lines).contains(&"Pods: Pending 1, Running 4"));
    }

    #[test]
    fn test_failed_panel_shows_message() {
        let lines = status_lines(&PanelState::Failed("Refresh failed: /api/status -> 500".to_string()));
        assert_eq!(texts(&lines), vec!["Refresh failed: /api/status -> 500"]);
        assert_eq!(lines[0].tone, Tone::Bad);
    }

    #[test]
    fn test_timeline_empty_state() {
        let lines = timeline_lines(&PanelState::Ready(FaultTimeline::default()));
        assert_eq!(texts(&lines), vec![EMPTY_TIMELINE]);
    }

    #[test]
    fn test_timeline_newest_first_with_detail() {
        let timeline = FaultTimeline::new(vec![
            FaultEvent {
                action: "kill-ost-0".to_string(),
                timestamp: "10:00".to_string(),
                status: "ok".to_string(),
                detail: None,
            },
            FaultEvent {
                action: "partition-mds".to_string(),
                timestamp: "10:05".to_string(),
                status: "error".to_string(),
                detail: Some("timeout waiting for pod".to_string()),
            },
        ]);

        let lines = timeline_lines(&PanelState::Ready(timeline));
        assert_eq!(
            texts(&lines),
            vec![
                "partition-mds [error]",
                "  10:05",
                "  timeout waiting for pod",
                "kill-ost-0 [ok]",
                "  10:00",
            ]
        );
        assert_eq!(lines[0].tone, Tone::Bad);
        assert_eq!(lines[3].tone, Tone::Good);
    }

    #[test]
    fn test_benchmark_unavailable_is_not_zero() {
        let lines = benchmark_lines(&PanelState::Ready(BenchmarkSummary::Unavailable));
        let texts = texts(&lines);
        assert_eq!(texts[0], "No benchmark run found yet.");
        assert_eq!(texts[1], "Seq read (MB/s): --");
        assert_eq!(texts[5], "Run make benchmark to generate live results.");
        assert!(!texts.iter().any(|t| t.ends_with(": 0")));
    }

    #[test]
    fn test_benchmark_available() {
        let run = BenchmarkRun {
            run_id: "20240501-101500".to_string(),
            seq_read_mbps: Some(1812.456),
            seq_write_mbps: Some(640.0),
            rand_read_iops: Some(15234.0),
            rand_write_iops: None,
            metadata_info: None,
            collected_at: Some("2024-05-01T10:20:00Z".to_string()),
        };
        let lines = benchmark_lines(&PanelState::Ready(BenchmarkSummary::Available(run)));
        assert_eq!(
            texts(&lines),
            vec![
                "Latest run: 20240501-101500",
                "Seq read (MB/s): 1,812.46",
                "Seq write (MB/s): 640",
                "Rand read (IOPS): 15,234",
                "Rand write (IOPS): --",
                "No metadata benchmark info.",
                "Collected at 2024-05-01T10:20:00Z",
            ]
        );
    }

    #[test]
    fn test_metrics_lines_samples_with_gap() {
        let panel = MetricsPanel {
            outcome: MetricsOutcome::Samples(MetricReadings {
                write_p95_ms: Some(250.0),
                read_throughput_mbps: Some(100.0),
                iops: None,
                lock_contention_p95_ms: Some(0.0),
            }),
            prometheus_url: "http://127.0.0.1:9090".to_string(),
        };
        let lines = metrics_lines(&panel);
        assert_eq!(
            texts(&lines),
            vec![
                "Write p95: 250 ms",
                "Read throughput: 100 MB/s",
                "IOPS: --",
                "MDS lock p95: 0 ms",
                "Prometheus source: http://127.0.0.1:9090",
            ]
        );
    }

    #[test]
    fn test_metrics_lines_no_recent_samples() {
        let panel = MetricsPanel {
            outcome: MetricsOutcome::NoRecentSamples,
            prometheus_url: "http://127.0.0.1:9090".to_string(),
        };
        let values = metric_values(&panel);
        assert!(values.iter().all(|(_, v)| v == "--"));
        assert_eq!(metrics_hint(&panel).tone, Tone::Warn);
    }

    #[test]
    fn test_render_text_sections() {
        let snapshot = DashboardSnapshot {
            cycle: 3,
            completed_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            status: PanelState::Ready(status()),
            timeline: PanelState::Ready(FaultTimeline::default()),
            benchmark: PanelState::Failed("Refresh failed: /api/benchmarks/latest -> 502".to_string()),
            metrics: MetricsPanel {
                outcome: MetricsOutcome::Failed("/api/prometheus -> 502".to_string()),
                prometheus_url: "http://prom:9090".to_string(),
            },
        };

        let text = render_text(&snapshot, "http://prom:9090", "http://127.0.0.1:3000");
        assert!(text.starts_with("kube-pfs dashboard (cycle 3, 2024-05-01 10:00:00 UTC)"));
        assert!(text.contains("== Fault timeline ==\nNo fault events recorded yet."));
        assert!(text.contains("Refresh failed: /api/benchmarks/latest -> 502"));
        assert!(text.contains("Write p95: --"));
        assert!(text.contains("Prometheus query failed (http://prom:9090)"));
        assert!(text.contains("Grafana: http://127.0.0.1:3000"));
    }
}
