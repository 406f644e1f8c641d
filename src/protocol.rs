// Wire protocol and cross-layer message types.
//
// The server speaks JSON text frames, each carrying a required `type`
// discriminator. Modeling the taxonomy as a serde-tagged enum means a
// message type the dispatcher forgot to handle is a compile error, not a
// silent log line at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Server -> client messages
// ---------------------------------------------------------------------------

/// One inbound frame, dispatched by the `type` field.
///
/// Unknown `type` values fail deserialization; the dispatcher logs and
/// discards them without touching state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full grid replacement. Cells absent from the list keep defaults.
    Init {
        #[serde(default)]
        cells: Vec<CellPatch>,
    },
    /// Partial update of a single cell.
    Update { cell: CellPatch },
    /// The current round's predicted tile set.
    Predictions {
        preds: Vec<i64>,
        #[serde(default)]
        round: RoundId,
        status: RoundStatus,
    },
    /// Round result: winning tiles plus cumulative counters.
    Winning {
        preds: Vec<i64>,
        status: RoundStatus,
        #[serde(default)]
        total_win: u64,
        #[serde(default)]
        total_round: u64,
        #[serde(default)]
        lost_in_arrow: u64,
    },
    /// Status-only transition between rounds.
    Waiting { status: RoundStatus },
    /// Wholesale replacement of one or more per-variant round snapshots.
    Snapshot {
        #[serde(default)]
        classic_snapshot: Option<SnapshotPayload>,
        #[serde(default)]
        ore_snapshot: Option<SnapshotPayload>,
        #[serde(default)]
        orb_snapshot: Option<SnapshotPayload>,
    },
    /// Historical win-streak histogram (streak length -> occurrences).
    WinInRow {
        list_in_row: BTreeMap<String, u32>,
    },
    /// Historical loss-streak histogram (streak length -> occurrences).
    LostInRow {
        list_in_row: BTreeMap<String, u32>,
    },
}

/// Partial cell record carried by `init` and `update` frames.
///
/// Every field except `index` is optional; reducers decide between
/// "fall back to default" (init) and "retain prior value" (update).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellPatch {
    pub index: i64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub value: Option<CellValue>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

/// A cell's display value: numeric once the server has one, otherwise a
/// placeholder string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// The value shown before the server has reported anything.
    pub const PLACEHOLDER: &'static str = "\u{2014}";

    /// Format for display: four decimals for numbers, text verbatim.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => format!("{n:.4}"),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(Self::PLACEHOLDER.to_string())
    }
}

/// Round identifier. The server is inconsistent about sending `"12"` vs
/// `12`, so both are accepted and kept as a display string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RoundIdRepr")]
pub struct RoundId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RoundIdRepr {
    Num(i64),
    Str(String),
}

impl From<RoundIdRepr> for RoundId {
    fn from(repr: RoundIdRepr) -> Self {
        match repr {
            RoundIdRepr::Num(n) => RoundId(n.to_string()),
            RoundIdRepr::Str(s) => RoundId(s),
        }
    }
}

/// Lifecycle of a round as reported by the server.
///
/// Two protocol spellings exist for the active and terminal states;
/// aliases accept both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    #[default]
    Init,
    Waiting,
    #[serde(alias = "active")]
    Predictions,
    #[serde(alias = "result")]
    Done,
}

impl RoundStatus {
    /// Whether the round has ended and results are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundStatus::Done)
    }

    pub fn label(self) -> &'static str {
        match self {
            RoundStatus::Init => "init",
            RoundStatus::Waiting => "waiting",
            RoundStatus::Predictions => "predictions",
            RoundStatus::Done => "done",
        }
    }
}

/// Nested per-variant payload inside a `snapshot` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapshotPayload {
    pub status: RoundStatus,
    #[serde(default)]
    pub round: RoundId,
    #[serde(default)]
    pub preds: Vec<i64>,
    #[serde(default)]
    pub total_round: u64,
    #[serde(default)]
    pub total_win: u64,
    /// Current consecutive-win count.
    #[serde(default)]
    pub win: u64,
    /// Current consecutive-loss count.
    #[serde(default)]
    pub lose: u64,
    /// Longest win streak seen so far.
    #[serde(default)]
    pub win_in_row: u64,
    /// Longest loss streak seen so far.
    #[serde(default)]
    pub lose_in_row: u64,
    #[serde(default)]
    pub winning_square: Option<i64>,
}

// ---------------------------------------------------------------------------
// Client -> server messages
// ---------------------------------------------------------------------------

/// Outbound command sent over the live socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request the initial grid state after connecting.
    GetInit,
    /// Toggle the prediction on a grid cell.
    Toggle { index: usize },
}

// ---------------------------------------------------------------------------
// View identity
// ---------------------------------------------------------------------------

/// The three navigable dashboard views. Each has its own endpoint and its
/// own connection session; all three retain their game state while hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Classic,
    Ore,
    Orb,
}

impl ViewId {
    pub const ALL: [ViewId; 3] = [ViewId::Classic, ViewId::Ore, ViewId::Orb];

    /// Stable position used to index per-view storage.
    pub fn index(self) -> usize {
        match self {
            ViewId::Classic => 0,
            ViewId::Ore => 1,
            ViewId::Orb => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewId::Classic => "Classic",
            ViewId::Ore => "Ore",
            ViewId::Orb => "Orb",
        }
    }
}

// ---------------------------------------------------------------------------
// Internal channel types
// ---------------------------------------------------------------------------

/// Whether the live socket is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Commands flowing from the TUI to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Toggle the prediction on the cell under the cursor.
    ToggleCell(usize),
    /// Switch the dashboard to another view (tears down the old session).
    SwitchView(ViewId),
    /// Re-fetch the per-tile percentage annotations.
    RefreshAnnotations,
    Quit,
}

/// Updates flowing from the orchestrator to the TUI render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    ConnectionStatus(ConnectionStatus),
    /// Full snapshot of the active view's game state.
    Game(Box<crate::game::state::ViewSnapshot>),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_frame_parses_with_partial_cells() {
        let raw = r#"{"type":"init","cells":[{"index":3,"count":7}]}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Init { cells } => {
                assert_eq!(cells.len(), 1);
                assert_eq!(cells[0].index, 3);
                assert_eq!(cells[0].count, Some(7));
                assert_eq!(cells[0].label, None);
                assert_eq!(cells[0].disabled, None);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn init_frame_without_cells_list_defaults_empty() {
        let msg: ServerMessage = serde_json::from_str(r#"{"type":"init"}"#).unwrap();
        assert_eq!(msg, ServerMessage::Init { cells: vec![] });
    }

    #[test]
    fn update_frame_requires_cell() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"type":"update"}"#).is_err());
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"update","cell":{"index":4,"disabled":true}}"#)
                .unwrap();
        match msg {
            ServerMessage::Update { cell } => assert_eq!(cell.disabled, Some(true)),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn predictions_frame_rejects_non_list_preds() {
        let raw = r#"{"type":"predictions","preds":"oops","round":1,"status":"predictions"}"#;
        assert!(serde_json::from_str::<ServerMessage>(raw).is_err());
    }

    #[test]
    fn round_id_accepts_number_or_string() {
        let raw = r#"{"type":"predictions","preds":[1],"round":12,"status":"predictions"}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Predictions { round, .. } => assert_eq!(round, RoundId("12".into())),
            other => panic!("wrong variant: {other:?}"),
        }

        let raw = r#"{"type":"predictions","preds":[1],"round":"12","status":"predictions"}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Predictions { round, .. } => assert_eq!(round, RoundId("12".into())),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn status_aliases_accepted() {
        for (raw, expected) in [
            (r#""init""#, RoundStatus::Init),
            (r#""waiting""#, RoundStatus::Waiting),
            (r#""predictions""#, RoundStatus::Predictions),
            (r#""active""#, RoundStatus::Predictions),
            (r#""done""#, RoundStatus::Done),
            (r#""result""#, RoundStatus::Done),
        ] {
            let status: RoundStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, expected, "for {raw}");
        }
        assert!(serde_json::from_str::<RoundStatus>(r#""bogus""#).is_err());
    }

    #[test]
    fn only_done_is_terminal() {
        assert!(RoundStatus::Done.is_terminal());
        assert!(!RoundStatus::Init.is_terminal());
        assert!(!RoundStatus::Waiting.is_terminal());
        assert!(!RoundStatus::Predictions.is_terminal());
    }

    #[test]
    fn unknown_type_fails_deserialization() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"type":"mystery"}"#).is_err());
    }

    #[test]
    fn snapshot_frame_with_one_variant() {
        let raw = r#"{"type":"snapshot","ore_snapshot":{"status":"result","round":9,
            "preds":[2,5],"total_round":10,"total_win":4,"win":0,"lose":2,
            "win_in_row":3,"lose_in_row":4,"winning_square":7}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Snapshot {
                classic_snapshot,
                ore_snapshot,
                orb_snapshot,
            } => {
                assert!(classic_snapshot.is_none());
                assert!(orb_snapshot.is_none());
                let snap = ore_snapshot.unwrap();
                assert_eq!(snap.status, RoundStatus::Done);
                assert_eq!(snap.winning_square, Some(7));
                assert_eq!(snap.total_round, 10);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn streak_histogram_frames_parse() {
        let raw = r#"{"type":"win_in_row","list_in_row":{"2":5,"3":1}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::WinInRow { list_in_row } => {
                assert_eq!(list_in_row.get("2"), Some(&5));
                assert_eq!(list_in_row.get("3"), Some(&1));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn client_messages_serialize_to_wire_shape() {
        assert_eq!(
            serde_json::to_string(&ClientMessage::GetInit).unwrap(),
            r#"{"type":"get_init"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientMessage::Toggle { index: 3 }).unwrap(),
            r#"{"type":"toggle","index":3}"#
        );
    }

    #[test]
    fn cell_value_display() {
        assert_eq!(CellValue::Number(0.4125).display(), "0.4125");
        assert_eq!(CellValue::default().display(), CellValue::PLACEHOLDER);
    }

    #[test]
    fn view_id_indices_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for view in ViewId::ALL {
            assert!(seen.insert(view.index()));
            assert!(view.index() < ViewId::ALL.len());
        }
    }
}
