// Correctness banner: shown once a round reaches its terminal status.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let verdict = state.snapshot.as_ref().and_then(|s| s.verdict);
    let (text, style) = banner_content(verdict);
    let paragraph = Paragraph::new(Line::from(Span::styled(text, style))).centered();
    frame.render_widget(paragraph, area);
}

/// Banner text and style for the current verdict. Nothing is emphasized
/// until the round is terminal.
pub fn banner_content(verdict: Option<bool>) -> (&'static str, Style) {
    match verdict {
        Some(true) => (
            "\u{2705} CORRECT",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Some(false) => (
            "\u{274c} INCORRECT",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        None => ("", Style::default()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
