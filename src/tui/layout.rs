// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the dashboard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Correctness Banner (1 row)                        |
// +-------------------------+------------------------+
// | Grid (60%)              | Sidebar (40%)           |
// | 5x5 cell matrix         | +- Summary (50%) ------+|
// |                         | +- Streaks (50%) ------+|
// +-------------------------+------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::game::cell::{CELL_COUNT, GRID_SIZE};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection indicator, view tabs, round number.
    pub status_bar: Rect,
    /// Correct/incorrect verdict once a round finishes.
    pub banner: Rect,
    /// The 5x5 prediction grid.
    pub grid: Rect,
    /// Sidebar top: totals, win rate, current streaks.
    pub summary: Rect,
    /// Sidebar bottom: historical streak histograms.
    pub streaks: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(1), // banner
            Constraint::Min(10),   // middle (grid + sidebar)
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let banner = vertical[1];
    let middle = vertical[2];
    let help_bar = vertical[3];

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(middle);

    let grid = horizontal[0];
    let sidebar = horizontal[1];

    let sidebar_sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sidebar);

    AppLayout {
        status_bar,
        banner,
        grid,
        summary: sidebar_sections[0],
        streaks: sidebar_sections[1],
        help_bar,
    }
}

/// Split the grid zone into 25 equal cell rectangles, row-major so the
/// result indexes match cell indices.
pub fn grid_cells(area: Rect) -> Vec<Rect> {
    let row_constraints = vec![Constraint::Ratio(1, GRID_SIZE as u32); GRID_SIZE];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    let mut cells = Vec::with_capacity(CELL_COUNT);
    for row in rows.iter() {
        let col_constraints = vec![Constraint::Ratio(1, GRID_SIZE as u32); GRID_SIZE];
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row);
        cells.extend(cols.iter().copied());
    }
    cells
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 160, 50)
    }

    #[test]
    fn layout_all_rects_nonzero() {
        let layout = build_layout(test_area());
        let rects = [
            ("status_bar", layout.status_bar),
            ("banner", layout.banner),
            ("grid", layout.grid),
            ("summary", layout.summary),
            ("streaks", layout.streaks),
            ("help_bar", layout.help_bar),
        ];
        for (name, rect) in &rects {
            assert!(
                rect.width > 0 && rect.height > 0,
                "{name} has zero area: {rect:?}"
            );
        }
    }

    #[test]
    fn layout_bars_are_single_rows() {
        let layout = build_layout(test_area());
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.banner.height, 1);
        assert_eq!(layout.help_bar.height, 1);
    }

    #[test]
    fn layout_grid_wider_than_sidebar() {
        let layout = build_layout(test_area());
        assert!(layout.grid.width > layout.summary.width);
    }

    #[test]
    fn layout_sidebar_sections_stack_vertically() {
        let layout = build_layout(test_area());
        assert!(layout.summary.y < layout.streaks.y);
        assert_eq!(layout.summary.width, layout.streaks.width);
    }

    #[test]
    fn grid_cells_count_and_order() {
        let layout = build_layout(test_area());
        let cells = grid_cells(layout.grid);
        assert_eq!(cells.len(), CELL_COUNT);
        // Row-major: cell 5 starts a new row below cell 0.
        assert_eq!(cells[0].y, cells[4].y);
        assert!(cells[5].y > cells[0].y);
        assert_eq!(cells[0].x, cells[5].x);
    }

    #[test]
    fn grid_cells_fit_within_area() {
        let layout = build_layout(test_area());
        for rect in grid_cells(layout.grid) {
            assert!(rect.x + rect.width <= layout.grid.x + layout.grid.width);
            assert!(rect.y + rect.height <= layout.grid.y + layout.grid.height);
        }
    }

    #[test]
    fn layout_small_terminal_still_valid() {
        let area = Rect::new(0, 0, 40, 16);
        let layout = build_layout(area);
        for rect in [layout.status_bar, layout.grid, layout.help_bar] {
            assert!(rect.width > 0 && rect.height > 0);
        }
    }
}
