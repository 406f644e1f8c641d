// Streak histogram panel: how often each streak length has occurred.

use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::game::state::ViewSnapshot;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let content = match &state.snapshot {
        Some(snapshot) => histogram_lines(snapshot).join("\n"),
        None => String::new(),
    };
    let paragraph =
        Paragraph::new(content).block(Block::default().borders(Borders::ALL).title("Streaks"));
    frame.render_widget(paragraph, area);
}

/// One line per recorded streak length, wins first. BTreeMap iteration
/// keeps the lengths sorted.
pub fn histogram_lines(snapshot: &ViewSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if !snapshot.win_histogram.is_empty() {
        lines.push("Win streaks".to_string());
        for (length, occurrences) in &snapshot.win_histogram {
            lines.push(format!("  {length} in a row: {occurrences}x"));
        }
    }
    if !snapshot.loss_histogram.is_empty() {
        lines.push("Loss streaks".to_string());
        for (length, occurrences) in &snapshot.loss_histogram {
            lines.push(format!("  {length} in a row: {occurrences}x"));
        }
    }
    if lines.is_empty() {
        lines.push("No streak history yet.".to_string());
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
