//! Application state and main event loop for the terminal dashboard.
//!
//! [`App`] holds what the renderer needs between frames: the latest
//! published snapshot and the timeline scroll position. [`run`] owns the
//! terminal and drives the loop; refreshing happens in the poller task.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info};

use super::ui;
use crate::error::{DashboardError, Result};
use crate::model::DashboardSnapshot;
use crate::poller::{DashboardContext, PollerHandle};

/// How long the loop sleeps when no input is pending.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// All application state for the dashboard.
pub struct App {
    backend: String,
    prometheus_url: String,
    grafana_url: String,
    snapshot: Option<Arc<DashboardSnapshot>>,
    timeline_scroll: u16,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        backend: impl Into<String>,
        prometheus_url: impl Into<String>,
        grafana_url: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            prometheus_url: prometheus_url.into(),
            grafana_url: grafana_url.into(),
            snapshot: None,
            timeline_scroll: 0,
            should_quit: false,
        }
    }

    pub fn from_context(ctx: &DashboardContext) -> Self {
        Self::new(ctx.backend_description(), ctx.prometheus_url(), ctx.grafana_url())
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn prometheus_url(&self) -> &str {
        &self.prometheus_url
    }

    pub fn grafana_url(&self) -> &str {
        &self.grafana_url
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_deref()
    }

    pub fn timeline_scroll(&self) -> u16 {
        self.timeline_scroll
    }

    /// Replace the displayed snapshot wholesale.
    pub fn set_snapshot(&mut self, snapshot: Arc<DashboardSnapshot>) {
        self.timeline_scroll = self.timeline_scroll.min(max_scroll(&snapshot));
        self.snapshot = Some(snapshot);
    }

    /// Handle a key press. Returns the action the event loop must perform.
    pub fn handle_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.snapshot.as_deref().map_or(0, max_scroll);
                if self.timeline_scroll < max {
                    self.timeline_scroll += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.timeline_scroll = self.timeline_scroll.saturating_sub(1);
            }
            _ => {}
        }
        Action::None
    }
}

/// Last scroll offset that still shows at least one timeline line.
fn max_scroll(snapshot: &DashboardSnapshot) -> u16 {
    let lines = super::view::timeline_lines(&snapshot.timeline).len();
    u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
}

/// Actions that need the poller after key handling.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Refresh,
}

/// Main entry point for the terminal dashboard.
///
/// Takes over the terminal, renders every published snapshot and forwards
/// manual refreshes to the poller until the user quits. The terminal is
/// restored on every path once raw mode is on.
pub async fn run(ctx: &DashboardContext, poller: &PollerHandle) -> Result<()> {
    enable_raw_mode()?;

    let outcome = match enter_screen() {
        Ok(mut terminal) => {
            let mut app = App::from_context(ctx);
            event_loop(&mut terminal, &mut app, poller).await
        }
        Err(e) => Err(e),
    };

    finish(outcome, restore_terminal())
}

fn enter_screen() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Runs every restore step, reporting the first failure.
fn restore_terminal() -> io::Result<()> {
    let steps = [
        disable_raw_mode(),
        execute!(io::stdout(), LeaveAlternateScreen, cursor::Show),
    ];
    steps.into_iter().collect()
}

/// The loop's own error wins over a restore error.
fn finish(outcome: Result<()>, restored: io::Result<()>) -> Result<()> {
    outcome.and(restored.map_err(DashboardError::from))
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    poller: &PollerHandle,
) -> Result<()> {
    let mut snapshots = poller.subscribe();
    let mut dirty = true;

    loop {
        if snapshots.has_changed().unwrap_or(false) {
            if let Some(snapshot) = snapshots.borrow_and_update().clone() {
                debug!(cycle = snapshot.cycle, "Rendering snapshot");
                app.set_snapshot(snapshot);
            }
            dirty = true;
        }

        if dirty {
            terminal
                .draw(|f| ui::draw(f, app))
                .map_err(|e| DashboardError::Terminal(e.to_string()))?;
            dirty = false;
        }

        // Non-blocking so the poller keeps running on this thread.
        if event::poll(Duration::ZERO)? {
            match event::read()? {
                // raw mode swallows SIGINT
                Event::Key(key)
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    app.should_quit = true;
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key.code) == Action::Refresh {
                        poller.refresh_now();
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(FRAME_INTERVAL).await;
        }

        if app.should_quit {
            info!("Quit requested");
            return Ok(());
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        FaultEvent, FaultTimeline, MetricsOutcome, MetricsPanel, PanelState, StatusSnapshot,
    };
    use chrono::Utc;

    fn snapshot(events: usize) -> Arc<DashboardSnapshot> {
        let events = (0..events)
            .map(|i| FaultEvent {
                action: format!("fault-{i}"),
                timestamp: "t".to_string(),
                status: "ok".to_string(),
                detail: None,
            })
            .collect();
        Arc::new(DashboardSnapshot {
            cycle: 1,
            completed_at: Utc::now(),
            status: PanelState::Ready(StatusSnapshot::default()),
            timeline: PanelState::Ready(FaultTimeline::new(events)),
            benchmark: PanelState::Failed("x".to_string()),
            metrics: MetricsPanel {
                outcome: MetricsOutcome::NoRecentSamples,
                prometheus_url: String::new(),
            },
        })
    }

    fn app() -> App {
        App::new("static", "http://127.0.0.1:9090", "http://127.0.0.1:3000")
    }

    #[test]
    fn test_finish_prefers_loop_error() {
        let restore_failed = || Err(io::Error::other("tty gone"));

        assert!(finish(Ok(()), Ok(())).is_ok());

        let err = finish(Ok(()), restore_failed()).unwrap_err();
        assert_eq!(err.to_string(), "I/O error: tty gone");

        let err = finish(Err(DashboardError::Terminal("draw".to_string())), restore_failed()).unwrap_err();
        assert_eq!(err.to_string(), "Terminal error: draw");
    }

    #[test]
    fn test_quit_keys() {
        let mut by_letter = app();
        assert_eq!(by_letter.handle_key(KeyCode::Char('q')), Action::None);
        assert!(by_letter.should_quit);

        let mut by_escape = app();
        by_escape.handle_key(KeyCode::Esc);
        assert!(by_escape.should_quit);
    }

    #[test]
    fn test_refresh_key() {
        let mut app = app();
        assert_eq!(app.handle_key(KeyCode::Char('r')), Action::Refresh);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_timeline_scroll_is_clamped() {
        let mut app = app();
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.timeline_scroll(), 0);

        // two events render as four lines
        app.set_snapshot(snapshot(2));
        for _ in 0..10 {
            app.handle_key(KeyCode::Char('j'));
        }
        assert_eq!(app.timeline_scroll(), 3);

        app.handle_key(KeyCode::Char('k'));
        assert_eq!(app.timeline_scroll(), 2);

        // a shorter timeline pulls the offset back in range
        app.set_snapshot(snapshot(0));
        assert_eq!(app.timeline_scroll(), 0);
    }
}
