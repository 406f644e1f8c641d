// The 5x5 prediction grid.
//
// Each cell shows its label, activity count, and annotation percentage.
// Border color encodes selection state; the round phase controls dimming
// (see the derived-state rules in the game module).

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::game::cell::CELL_COUNT;
use crate::game::state::{CellEmphasis, CellView};
use crate::tui::layout::grid_cells;
use crate::tui::ViewState;

/// Annotation percentage above which a tile counts as "hot": the uniform
/// chance of one tile out of 25.
pub const HOT_PERCENTAGE: f64 = 100.0 / CELL_COUNT as f64;

/// Render the grid into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = &state.snapshot else {
        let placeholder = Paragraph::new("Waiting for first frame...")
            .block(Block::default().borders(Borders::ALL).title("Grid"));
        frame.render_widget(placeholder, area);
        return;
    };

    let rects = grid_cells(area);
    for (cell_view, rect) in snapshot.cells.iter().zip(rects) {
        render_cell(frame, rect, cell_view, cell_view.cell.index == state.cursor);
    }
}

fn render_cell(frame: &mut Frame, rect: Rect, view: &CellView, is_cursor: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(view, is_cursor))
        .title(view.cell.label.clone());

    let mut lines = vec![
        Line::styled(format!("{}", view.cell.count), text_style(view)),
        Line::styled(
            format!("%{:.2}", view.cell.percentage),
            percentage_style(view.cell.percentage).patch(dim_patch(view)),
        ),
    ];
    if rect.height > 4 {
        lines.push(Line::styled(view.cell.value.display(), text_style(view)));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, rect);
}

/// Border style for one cell: cursor beats winning beats predicted.
pub fn border_style(view: &CellView, is_cursor: bool) -> Style {
    let mut style = if is_cursor {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if view.emphasis == CellEmphasis::Winning {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if view.predicted {
        Style::default().fg(Color::Blue)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if view.emphasis == CellEmphasis::Dimmed && !is_cursor {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

/// Text style, carrying the dimming of in-flight rounds.
fn text_style(view: &CellView) -> Style {
    let base = if view.cell.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    base.patch(dim_patch(view))
}

fn dim_patch(view: &CellView) -> Style {
    if view.emphasis == CellEmphasis::Dimmed {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    }
}

/// Green for tiles beating the uniform 4% chance, red otherwise.
pub fn percentage_style(percentage: f64) -> Style {
    if percentage > HOT_PERCENTAGE {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
