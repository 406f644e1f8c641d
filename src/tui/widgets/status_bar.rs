// Status bar widget: connection indicator, view tabs, round number.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::{ConnectionStatus, ViewId};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [connection indicator] [view tabs] [round]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color, label) = connection_indicator(state.connection_status);
    spans.push(Span::styled(
        format!(" {dot} {label} "),
        Style::default().fg(dot_color),
    ));
    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));

    spans.extend(tab_spans(state.active_view()));

    if let Some(snapshot) = &state.snapshot {
        spans.push(Span::styled(
            format!("| Round {}", snapshot.round.0),
            Style::default().fg(Color::White),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Connection dot character, color, and label.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color, &'static str) {
    match status {
        ConnectionStatus::Connected => ("\u{25cf}", Color::Green, "Connected"),
        ConnectionStatus::Disconnected => ("\u{25cf}", Color::Red, "Disconnected"),
    }
}

/// Build view tab spans with the active view highlighted, e.g.
/// "[1:Classic] [2:Ore] [3:Orb]".
pub fn tab_spans(active: ViewId) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, view) in ViewId::ALL.iter().enumerate() {
        let style = if *view == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, view.label()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
