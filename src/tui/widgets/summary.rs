// Summary panel: round progress, win rate, and current streaks.

use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::annotations::AnnotationHealth;
use crate::game::state::ViewSnapshot;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let content = match &state.snapshot {
        Some(snapshot) => summary_lines(snapshot).join("\n"),
        None => "No data yet.".to_string(),
    };
    let paragraph =
        Paragraph::new(content).block(Block::default().borders(Borders::ALL).title("Summary"));
    frame.render_widget(paragraph, area);
}

/// Build the summary text. The win rate is derived here on every render,
/// never read from a stored value.
pub fn summary_lines(snapshot: &ViewSnapshot) -> Vec<String> {
    let totals = &snapshot.totals;
    let mut lines = vec![
        format!("Round: {} ({})", snapshot.round.0, snapshot.status.label()),
        format!(
            "Total: {}/{} ({})",
            totals.total_win,
            totals.total_round,
            totals.losses()
        ),
        format!("Win rate: {}", totals.win_rate_display()),
        format!("Lost in arrow: {}", totals.lost_in_arrow),
        format!(
            "Streak: W{} / L{}",
            totals.win_streak, totals.loss_streak
        ),
        format!(
            "Best: W{} / L{}",
            totals.best_win_streak, totals.best_loss_streak
        ),
    ];
    match snapshot.annotations {
        AnnotationHealth::Available => {}
        AnnotationHealth::Pending => lines.push("Annotations: loading...".to_string()),
        AnnotationHealth::Unavailable => lines.push("Annotations: unavailable".to_string()),
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
