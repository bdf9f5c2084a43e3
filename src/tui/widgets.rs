//! Reusable TUI widget components for the dashboard.
//!
//! Thin building blocks on top of ratatui primitives:
//! - [`TextPanel`] - Bordered, optionally scrolled block of [`ViewLine`]s
//! - [`MetricCard`] - Stat card showing a labeled gauge value

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::view::{Tone, ViewLine};
use crate::format::UNAVAILABLE;

/// Style for a line tone.
pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Plain => Style::default().fg(Color::White),
        Tone::Muted => Style::default().fg(Color::DarkGray),
        Tone::Good => Style::default().fg(Color::Green),
        Tone::Warn => Style::default().fg(Color::Yellow),
        Tone::Bad => Style::default().fg(Color::Red),
        Tone::Strong => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    }
}

/// Convert view lines into styled ratatui lines.
pub fn styled_lines(lines: &[ViewLine]) -> Vec<Line<'_>> {
    lines
        .iter()
        .map(|line| Line::from(Span::styled(line.text.as_str(), tone_style(line.tone))))
        .collect()
}

// ── TextPanel ───────────────────────────────────────────────────────────────

/// A titled panel of display lines.
pub struct TextPanel<'a> {
    pub title: String,
    pub lines: &'a [ViewLine],
    pub scroll: u16,
}

impl<'a> TextPanel<'a> {
    /// Create a new panel.
    pub fn new(title: impl Into<String>, lines: &'a [ViewLine]) -> Self {
        Self {
            title: title.into(),
            lines,
            scroll: 0,
        }
    }

    /// Scroll the content down by `offset` lines.
    pub fn with_scroll(mut self, offset: u16) -> Self {
        self.scroll = offset;
        self
    }

    /// Render the panel into the given frame area.
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(styled_lines(self.lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", self.title)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        f.render_widget(paragraph, area);
    }
}

// ── MetricCard ──────────────────────────────────────────────────────────────

/// A stat card displaying a labeled value.
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub color: Color,
}

impl MetricCard {
    /// Create a new metric card. Unavailable values are dimmed.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let color = if value == UNAVAILABLE {
            Color::DarkGray
        } else {
            Color::Cyan
        };
        Self {
            label: label.into(),
            value,
            color,
        }
    }

    /// Render the metric card into the given frame area.
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let line = Line::from(Span::styled(
            &self.value,
            Style::default()
                .fg(self.color)
                .add_modifier(Modifier::BOLD),
        ));

        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", self.label)),
        );
        f.render_widget(paragraph, area);
    }
}

/// Split `area` into `n` equal columns.
pub fn columns(area: Rect, n: usize) -> Vec<Rect> {
    let n = n.max(1) as u32;
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..n).map(|_| Constraint::Ratio(1, n)).collect::<Vec<_>>())
        .split(area)
        .to_vec()
}

/// Helper to create a centered rect using a percentage of the available area.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_tone_style() {
        assert_eq!(tone_style(Tone::Good).fg, Some(Color::Green));
        assert_eq!(tone_style(Tone::Bad).fg, Some(Color::Red));
        assert_eq!(tone_style(Tone::Muted).fg, Some(Color::DarkGray));
        assert!(tone_style(Tone::Strong).add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_metric_card_dims_unavailable() {
        assert_eq!(MetricCard::new("IOPS", "--").color, Color::DarkGray);
        assert_eq!(MetricCard::new("IOPS", "980 ops/s").color, Color::Cyan);
    }

    #[test]
    fn test_text_panel_renders_title_and_lines() {
        let lines = vec![
            ViewLine::new("Connected to Kubernetes", Tone::Good),
            ViewLine::plain("Observability: healthy"),
        ];
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                TextPanel::new("Cluster", &lines).render(f, area);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains(" Cluster "));
        assert!(text.contains("Connected to Kubernetes"));
        assert!(text.contains("Observability: healthy"));
    }

    #[test]
    fn test_text_panel_scroll_hides_leading_lines() {
        let lines = vec![ViewLine::plain("first"), ViewLine::plain("second")];
        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                TextPanel::new("Faults", &lines).with_scroll(1).render(f, area);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(!text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn test_columns() {
        let cols = columns(Rect::new(0, 0, 80, 3), 4);
        assert_eq!(cols.len(), 4);
        assert_eq!(cols.iter().map(|r| r.width).sum::<u16>(), 80);
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.width < area.width);
        assert!(centered.height < area.height);
    }
}
