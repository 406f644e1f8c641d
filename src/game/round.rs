// Round state: status, predictions, winners, cumulative totals, and streak
// histograms for one game variant.

use std::collections::BTreeMap;

use crate::protocol::{RoundId, RoundStatus, SnapshotPayload};

use super::cell::valid_indices;

/// Cumulative win/loss counters for a game variant.
///
/// `total_round` is never zero: every write path normalizes a zero round
/// count to 1 so the derived win rate stays finite without any guard in
/// the view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub total_round: u64,
    pub total_win: u64,
    pub lost_in_arrow: u64,
    /// Current consecutive-win count.
    pub win_streak: u64,
    /// Current consecutive-loss count.
    pub loss_streak: u64,
    /// Longest win streak observed.
    pub best_win_streak: u64,
    /// Longest loss streak observed.
    pub best_loss_streak: u64,
}

impl Default for Totals {
    fn default() -> Self {
        Totals {
            total_round: 1,
            total_win: 0,
            lost_in_arrow: 0,
            win_streak: 0,
            loss_streak: 0,
            best_win_streak: 0,
            best_loss_streak: 0,
        }
    }
}

impl Totals {
    /// Derived win rate as a percentage. Never stored; recomputed on every
    /// render. Finite by the `total_round >= 1` invariant.
    pub fn win_rate(&self) -> f64 {
        self.total_win as f64 / self.total_round as f64 * 100.0
    }

    /// Win rate formatted for display, e.g. `41.67%`.
    pub fn win_rate_display(&self) -> String {
        format!("{:.2}%", self.win_rate())
    }

    /// Rounds lost, for the "diff" line in the summary panel.
    pub fn losses(&self) -> u64 {
        self.total_round.saturating_sub(self.total_win)
    }
}

/// Treat a zero total-round count as round 1 (data-layer normalization).
pub fn normalize_round(total_round: u64) -> u64 {
    total_round.max(1)
}

/// Live round state for one game variant. Replaced wholesale by `snapshot`
/// frames, updated incrementally by `predictions`/`winning`/`waiting`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundState {
    pub status: RoundStatus,
    pub round: RoundId,
    /// Currently predicted cell indices, all within [0, 24].
    pub preds: Vec<usize>,
    /// Winning cell indices for the finished round, all within [0, 24].
    pub winning: Vec<usize>,
    pub totals: Totals,
    /// Historical win-streak histogram (streak length -> occurrences).
    pub win_histogram: BTreeMap<u32, u32>,
    /// Historical loss-streak histogram (streak length -> occurrences).
    pub loss_histogram: BTreeMap<u32, u32>,
}

impl RoundState {
    /// Apply a `predictions` frame: replace the predicted set, round id,
    /// and status.
    pub fn apply_predictions(&mut self, preds: &[i64], round: RoundId, status: RoundStatus) {
        self.preds = valid_indices(preds);
        self.round = round;
        self.status = status;
    }

    /// Apply a `winning` frame: replace winning indices, status, and the
    /// cumulative totals.
    pub fn apply_winning(
        &mut self,
        preds: &[i64],
        status: RoundStatus,
        total_win: u64,
        total_round: u64,
        lost_in_arrow: u64,
    ) {
        self.winning = valid_indices(preds);
        self.status = status;
        self.totals.total_win = total_win;
        self.totals.total_round = normalize_round(total_round);
        self.totals.lost_in_arrow = lost_in_arrow;
    }

    /// Apply a `waiting` frame: status only.
    pub fn apply_waiting(&mut self, status: RoundStatus) {
        self.status = status;
    }

    /// Replace this round state wholesale from a per-variant snapshot.
    /// Histograms are not part of the snapshot payload and are retained.
    pub fn apply_snapshot(&mut self, snap: &SnapshotPayload) {
        self.status = snap.status;
        self.round = snap.round.clone();
        self.preds = valid_indices(&snap.preds);
        self.winning = snap
            .winning_square
            .and_then(|raw| super::cell::in_range(raw))
            .map(|i| vec![i])
            .unwrap_or_default();
        self.totals = Totals {
            total_round: normalize_round(snap.total_round),
            total_win: snap.total_win,
            lost_in_arrow: self.totals.lost_in_arrow,
            win_streak: snap.win,
            loss_streak: snap.lose,
            best_win_streak: snap.win_in_row,
            best_loss_streak: snap.lose_in_row,
        };
    }

    /// Replace a streak histogram wholesale. Non-numeric keys from the wire
    /// map are dropped.
    pub fn apply_histogram(&mut self, wins: bool, raw: &BTreeMap<String, u32>) {
        let parsed: BTreeMap<u32, u32> = raw
            .iter()
            .filter_map(|(k, &v)| k.parse::<u32>().ok().map(|len| (len, v)))
            .collect();
        if wins {
            self.win_histogram = parsed;
        } else {
            self.loss_histogram = parsed;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
