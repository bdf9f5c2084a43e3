//! UI layout and rendering for the dashboard.
//!
//! Layout, top to bottom:
//! - Header: title, backend, last completed cycle
//! - Cluster status and latest benchmark side by side
//! - Fault timeline and live metrics side by side
//! - Links and key help

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::App;
use super::view;
use super::widgets::{centered_rect, columns, styled_lines, MetricCard, TextPanel};
use crate::model::DashboardSnapshot;

/// Top-level rendering function.
pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),      // Header
            Constraint::Percentage(45), // Status + benchmark
            Constraint::Min(8),         // Timeline + metrics
            Constraint::Length(3),      // Links
            Constraint::Length(1),      // Status bar
        ])
        .split(area);

    draw_header(f, app, chunks[0]);

    match app.snapshot() {
        Some(snapshot) => {
            draw_primary(f, snapshot, chunks[1]);
            draw_secondary(f, app, snapshot, chunks[2]);
        }
        None => draw_waiting(f, app, area),
    }

    draw_links(f, app, chunks[3]);
    draw_status_bar(f, chunks[4]);
}

// ── Header ──────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let refreshed = match app.snapshot() {
        Some(snapshot) => format!(
            "cycle {} at {}",
            snapshot.cycle,
            snapshot.completed_at.format("%H:%M:%S")
        ),
        None => "waiting for first refresh".to_string(),
    };

    let header = Line::from(vec![
        Span::styled(
            " kube-pfs dashboard ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {}  ", app.backend())),
        Span::styled(refreshed, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(header), area);
}

// ── Panels ──────────────────────────────────────────────────────────────────

fn draw_primary(f: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let cols = columns(area, 2);

    let status = view::status_lines(&snapshot.status);
    TextPanel::new("Cluster", &status).render(f, cols[0]);

    let benchmark = view::benchmark_lines(&snapshot.benchmark);
    TextPanel::new("Benchmark", &benchmark).render(f, cols[1]);
}

fn draw_secondary(f: &mut Frame, app: &App, snapshot: &DashboardSnapshot, area: Rect) {
    let cols = columns(area, 2);

    let timeline = view::timeline_lines(&snapshot.timeline);
    let title = match snapshot.timeline.ready() {
        Some(events) if !events.is_empty() => format!("Fault timeline ({})", events.len()),
        _ => "Fault timeline".to_string(),
    };
    TextPanel::new(title, &timeline)
        .with_scroll(app.timeline_scroll())
        .render(f, cols[0]);

    draw_metrics(f, snapshot, cols[1]);
}

fn draw_metrics(f: &mut Frame, snapshot: &DashboardSnapshot, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Live metrics ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    let values = view::metric_values(&snapshot.metrics);
    for (i, (label, value)) in values.into_iter().enumerate() {
        let row = columns(rows[i / 2], 2);
        MetricCard::new(label, value).render(f, row[i % 2]);
    }

    let hint = [view::metrics_hint(&snapshot.metrics)];
    f.render_widget(
        Paragraph::new(styled_lines(&hint)).wrap(Wrap { trim: true }),
        rows[2],
    );
}

fn draw_links(f: &mut Frame, app: &App, area: Rect) {
    let links = view::link_lines(app.prometheus_url(), app.grafana_url());
    let spans: Vec<Span> = links
        .iter()
        .flat_map(|line| [Span::raw(line.text.as_str()), Span::raw("    ")])
        .collect();

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Links "));
    f.render_widget(paragraph, area);
}

fn draw_waiting(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(50, 20, area);
    let text = vec![
        Line::from("Waiting for the first refresh..."),
        Line::from(Span::styled(
            app.backend().to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL)),
        popup,
    );
}

// ── Status Bar ──────────────────────────────────────────────────────────────

fn draw_status_bar(f: &mut Frame, area: Rect) {
    let status = Line::from(vec![
        Span::styled(
            " LIVE ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " q:quit  r:refresh  j/k:scroll timeline ",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{FaultTimeline, MetricsOutcome, MetricsPanel, PanelState, StatusSnapshot};
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_waiting() {
        let app = App::new("http://127.0.0.1:8088", "http://127.0.0.1:9090", "http://127.0.0.1:3000");
        let text = render(&app);
        assert!(text.contains("Waiting for the first refresh..."));
        assert!(text.contains("Grafana: http://127.0.0.1:3000"));
    }

    #[test]
    fn test_draw_snapshot() {
        let mut app = App::new("http://127.0.0.1:8088", "http://127.0.0.1:9090", "http://127.0.0.1:3000");
        app.set_snapshot(Arc::new(DashboardSnapshot {
            cycle: 4,
            completed_at: Utc::now(),
            status: PanelState::Ready(StatusSnapshot {
                connected: true,
                observability_health: "healthy".to_string(),
                ..StatusSnapshot::default()
            }),
            timeline: PanelState::Ready(FaultTimeline::default()),
            benchmark: PanelState::Failed("Refresh failed: /api/benchmarks/latest -> 500".to_string()),
            metrics: MetricsPanel {
                outcome: MetricsOutcome::NoRecentSamples,
                prometheus_url: "http://127.0.0.1:9090".to_string(),
            },
        }));

        let text = render(&app);
        assert!(text.contains("cycle 4"));
        assert!(text.contains("Connected to Kubernetes"));
        assert!(text.contains("No fault events recorded yet."));
        assert!(text.contains("Refresh failed: /api/benchmarks/latest -> 500"));
        assert!(text.contains("Write p95"));
    }
}
