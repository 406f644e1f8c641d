// Message dispatch and the per-variant state store.
//
// `GameStore` holds one `GameState` per dashboard view. Untagged frames
// (`init`, `update`, `predictions`, ...) apply to the view that owns the
// connection they arrived on; `snapshot` frames carry per-variant payloads
// and route to the named variant regardless of the active view.

use tracing::{debug, warn};

use crate::annotations::{AnnotationHealth, AnnotationState};
use crate::protocol::{RoundId, RoundStatus, ServerMessage, ViewId};

use super::cell::{Cell, CellGrid};
use super::round::RoundState;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Complete game state for one view variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub view: ViewId,
    pub grid: CellGrid,
    pub round: RoundState,
}

impl GameState {
    pub fn new(view: ViewId) -> Self {
        GameState {
            view,
            grid: CellGrid::new(),
            round: RoundState::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// What a processed frame asks of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// State was mutated (or the frame was a benign no-op).
    Applied,
    /// State was mutated and the annotation fetch should be re-triggered
    /// (a new prediction round has started).
    RefreshAnnotations,
    /// The frame was malformed or of an unknown type and was discarded.
    Discarded,
}

/// All per-variant game states, keyed by [`ViewId`].
#[derive(Debug, Clone, PartialEq)]
pub struct GameStore {
    states: Vec<GameState>,
}

impl Default for GameStore {
    fn default() -> Self {
        GameStore {
            states: ViewId::ALL.iter().map(|&v| GameState::new(v)).collect(),
        }
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, view: ViewId) -> &GameState {
        &self.states[view.index()]
    }

    pub fn state_mut(&mut self, view: ViewId) -> &mut GameState {
        &mut self.states[view.index()]
    }

    /// Parse and dispatch one raw text frame that arrived on `view`'s
    /// connection. Malformed JSON and unknown message types are logged and
    /// discarded; they never mutate state and never propagate an error.
    pub fn apply_frame(&mut self, view: ViewId, raw: &str) -> FrameOutcome {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "invalid JSON frame, discarding");
                return FrameOutcome::Discarded;
            }
        };
        let msg: ServerMessage = match serde_json::from_value(value.clone()) {
            Ok(msg) => msg,
            Err(err) => {
                let msg_type = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("<missing>");
                warn!(msg_type, %err, "unhandled or malformed frame, discarding");
                return FrameOutcome::Discarded;
            }
        };
        self.apply_message(view, msg)
    }

    /// Dispatch an already-parsed message.
    pub fn apply_message(&mut self, view: ViewId, msg: ServerMessage) -> FrameOutcome {
        match msg {
            ServerMessage::Init { cells } => {
                debug!(view = view.label(), cells = cells.len(), "applying init");
                self.state_mut(view).grid.apply_init(&cells);
                FrameOutcome::Applied
            }
            ServerMessage::Update { cell } => {
                self.state_mut(view).grid.apply_update(&cell);
                FrameOutcome::Applied
            }
            ServerMessage::Predictions {
                preds,
                round,
                status,
            } => {
                debug!(view = view.label(), ?preds, "applying predictions");
                self.state_mut(view)
                    .round
                    .apply_predictions(&preds, round, status);
                FrameOutcome::RefreshAnnotations
            }
            ServerMessage::Winning {
                preds,
                status,
                total_win,
                total_round,
                lost_in_arrow,
            } => {
                self.state_mut(view).round.apply_winning(
                    &preds,
                    status,
                    total_win,
                    total_round,
                    lost_in_arrow,
                );
                FrameOutcome::Applied
            }
            ServerMessage::Waiting { status } => {
                self.state_mut(view).round.apply_waiting(status);
                FrameOutcome::Applied
            }
            ServerMessage::Snapshot {
                classic_snapshot,
                ore_snapshot,
                orb_snapshot,
            } => {
                let payloads = [
                    (ViewId::Classic, classic_snapshot),
                    (ViewId::Ore, ore_snapshot),
                    (ViewId::Orb, orb_snapshot),
                ];
                for (target, payload) in payloads {
                    if let Some(snap) = payload {
                        debug!(view = target.label(), "applying snapshot");
                        self.state_mut(target).round.apply_snapshot(&snap);
                    }
                }
                FrameOutcome::Applied
            }
            ServerMessage::WinInRow { list_in_row } => {
                self.state_mut(view).round.apply_histogram(true, &list_in_row);
                FrameOutcome::Applied
            }
            ServerMessage::LostInRow { list_in_row } => {
                self.state_mut(view)
                    .round
                    .apply_histogram(false, &list_in_row);
                FrameOutcome::Applied
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

/// How a cell should be rendered given the round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEmphasis {
    /// Full visibility, no highlight.
    Normal,
    /// Highlighted as the winning cell (terminal status only).
    Winning,
    /// De-emphasized: a round is in flight and this cell is not a winner.
    Dimmed,
}

/// Derive the render emphasis for one cell.
///
/// While the round is `waiting` or `init` every cell renders at full
/// visibility. Only a terminal status (`done`) highlights the winning
/// cell. While a round is in flight every cell is dimmed; any winning
/// index still in the store belongs to the previous round and gets no
/// highlight.
pub fn cell_emphasis(status: RoundStatus, is_winning: bool) -> CellEmphasis {
    match status {
        RoundStatus::Init | RoundStatus::Waiting => CellEmphasis::Normal,
        RoundStatus::Done => {
            if is_winning {
                CellEmphasis::Winning
            } else {
                CellEmphasis::Normal
            }
        }
        RoundStatus::Predictions => CellEmphasis::Dimmed,
    }
}

/// Correctness verdict for the banner: `Some(true)` for a correct
/// prediction, `Some(false)` for incorrect, `None` while the round has not
/// reached a terminal status.
pub fn banner_verdict(status: RoundStatus, preds: &[usize], winning: &[usize]) -> Option<bool> {
    if !status.is_terminal() {
        return None;
    }
    Some(winning.iter().any(|w| preds.contains(w)))
}

// ---------------------------------------------------------------------------
// View snapshot
// ---------------------------------------------------------------------------

/// One cell prepared for rendering: raw state plus derived flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub cell: Cell,
    pub predicted: bool,
    pub winning: bool,
    pub emphasis: CellEmphasis,
}

/// Everything the TUI needs to draw one view, captured in a single
/// message. Built by the orchestrator after each state mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub view: ViewId,
    pub cells: Vec<CellView>,
    pub status: RoundStatus,
    pub round: RoundId,
    pub preds: Vec<usize>,
    pub winning: Vec<usize>,
    pub totals: super::round::Totals,
    pub win_histogram: BTreeMap<u32, u32>,
    pub loss_histogram: BTreeMap<u32, u32>,
    /// Correctness banner verdict; `None` until the round is terminal.
    pub verdict: Option<bool>,
    pub annotations: AnnotationHealth,
}

impl GameState {
    /// Build the render snapshot, merging per-tile percentage annotations
    /// positionally when available.
    pub fn snapshot(&self, annotations: &AnnotationState) -> ViewSnapshot {
        let percentages = annotations.percentages();
        let cells = self
            .grid
            .cells()
            .iter()
            .map(|cell| {
                let mut cell = cell.clone();
                if let Some(tiles) = percentages {
                    if let Some(&pct) = tiles.get(cell.index) {
                        cell.percentage = pct;
                    }
                }
                let predicted = self.round.preds.contains(&cell.index);
                let winning = self.round.winning.contains(&cell.index);
                CellView {
                    emphasis: cell_emphasis(self.round.status, winning),
                    cell,
                    predicted,
                    winning,
                }
            })
            .collect();

        ViewSnapshot {
            view: self.view,
            cells,
            status: self.round.status,
            round: self.round.round.clone(),
            preds: self.round.preds.clone(),
            winning: self.round.winning.clone(),
            totals: self.round.totals.clone(),
            win_histogram: self.round.win_histogram.clone(),
            loss_histogram: self.round.loss_histogram.clone(),
            verdict: banner_verdict(self.round.status, &self.round.preds, &self.round.winning),
            annotations: annotations.health(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
