// The 5x5 cell grid: defaults, init replacement, and partial merges.

use crate::protocol::{CellPatch, CellValue};

/// Grid side length. The game is fixed at 5x5.
pub const GRID_SIZE: usize = 5;
/// Total number of cells.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// One grid position. All 25 exist for the whole session; messages mutate
/// them in place and never add or remove cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub index: usize,
    pub label: String,
    pub count: i64,
    pub value: CellValue,
    pub disabled: bool,
    /// Externally supplied win-likelihood annotation (0-100). Zero until
    /// the annotation fetch has produced data.
    pub percentage: f64,
}

impl Cell {
    /// The documented defaults for cell `index`.
    pub fn with_defaults(index: usize) -> Self {
        Cell {
            index,
            label: default_label(index),
            count: 0,
            value: CellValue::default(),
            disabled: false,
            percentage: 0.0,
        }
    }
}

/// Default display label: `#1` through `#25`.
pub fn default_label(index: usize) -> String {
    format!("#{}", index + 1)
}

/// The full grid. Always holds exactly [`CELL_COUNT`] cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    cells: Vec<Cell>,
}

impl Default for CellGrid {
    fn default() -> Self {
        CellGrid {
            cells: (0..CELL_COUNT).map(Cell::with_defaults).collect(),
        }
    }
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Replace the entire grid from an `init` frame.
    ///
    /// Every cell is reset to defaults first, then patched from the list.
    /// Patches with an index outside [0, 24] are ignored; fields absent
    /// from a patch stay at their defaults.
    pub fn apply_init(&mut self, patches: &[CellPatch]) {
        self.cells = (0..CELL_COUNT).map(Cell::with_defaults).collect();
        for patch in patches {
            let Some(index) = in_range(patch.index) else {
                tracing::debug!(index = patch.index, "init patch index out of range, ignoring");
                continue;
            };
            let cell = &mut self.cells[index];
            if let Some(label) = &patch.label {
                cell.label = label.clone();
            }
            if let Some(count) = patch.count {
                cell.count = count;
            }
            if let Some(value) = &patch.value {
                cell.value = value.clone();
            }
            cell.disabled = patch.disabled.unwrap_or(false);
        }
    }

    /// Merge a partial cell record from an `update` frame.
    ///
    /// Fields absent from the patch retain their prior values, except
    /// `disabled` which is always overwritten (absent means false).
    /// Out-of-range indices are ignored.
    pub fn apply_update(&mut self, patch: &CellPatch) {
        let Some(index) = in_range(patch.index) else {
            tracing::debug!(index = patch.index, "update index out of range, ignoring");
            return;
        };
        let cell = &mut self.cells[index];
        if let Some(label) = &patch.label {
            cell.label = label.clone();
        }
        if let Some(count) = patch.count {
            cell.count = count;
        }
        if let Some(value) = &patch.value {
            cell.value = value.clone();
        }
        cell.disabled = patch.disabled.unwrap_or(false);
    }
}

/// Validate a raw wire index against the grid bounds.
pub fn in_range(raw: i64) -> Option<usize> {
    if (0..CELL_COUNT as i64).contains(&raw) {
        Some(raw as usize)
    } else {
        None
    }
}

/// Filter a raw wire index list down to valid grid positions.
pub fn valid_indices(raw: &[i64]) -> Vec<usize> {
    raw.iter().copied().filter_map(in_range).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
