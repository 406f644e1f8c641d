// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the orchestrator's state for
// rendering. The orchestrator pushes `UiUpdate` messages over an mpsc
// channel; the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::game::state::ViewSnapshot;
use crate::protocol::{ConnectionStatus, UiUpdate, UserCommand, ViewId};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    /// The latest snapshot of the active view, if any has arrived.
    pub snapshot: Option<ViewSnapshot>,
    pub connection_status: ConnectionStatus,
    /// Grid position under the keyboard cursor (0-24).
    pub cursor: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            snapshot: None,
            connection_status: ConnectionStatus::Disconnected,
            cursor: 0,
        }
    }
}

impl ViewState {
    /// The view currently displayed, falling back to the first view
    /// before any snapshot has arrived.
    pub fn active_view(&self) -> ViewId {
        self.snapshot
            .as_ref()
            .map(|s| s.view)
            .unwrap_or(ViewId::Classic)
    }
}

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Game(snapshot) => {
            state.snapshot = Some(*snapshot);
        }
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
        }
    }
}

// ---------------------------------------------------------------------------
// Frame rendering
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::banner::render(frame, layout.banner, state);
    widgets::grid::render(frame, layout.grid, state);
    widgets::summary::render(frame, layout.summary, state);
    widgets::streaks::render(frame, layout.streaks, state);
    render_help_bar(frame, &layout);
}

fn render_help_bar(frame: &mut Frame, layout: &layout::AppLayout) {
    let text = " q:Quit | 1-3:Views | arrows:Move | enter:Toggle | r:Refresh %";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal even when a draw panics.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break, // orchestrator is gone
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events need no handling; the next
                        // render tick redraws at the new size.
                    }
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationState;
    use crate::game::state::GameState;

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.snapshot.is_none());
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.active_view(), ViewId::Classic);
    }

    #[test]
    fn apply_ui_update_game_snapshot() {
        let mut state = ViewState::default();
        let snapshot = GameState::new(ViewId::Orb).snapshot(&AnnotationState::Pending);
        apply_ui_update(&mut state, UiUpdate::Game(Box::new(snapshot)));
        assert!(state.snapshot.is_some());
        assert_eq!(state.active_view(), ViewId::Orb);
    }

    #[test]
    fn apply_ui_update_connection_status() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::ConnectionStatus(ConnectionStatus::Connected),
        );
        assert_eq!(state.connection_status, ConnectionStatus::Connected);
    }

    #[test]
    fn snapshot_replaces_previous() {
        let mut state = ViewState::default();
        let first = GameState::new(ViewId::Ore).snapshot(&AnnotationState::Pending);
        let second = GameState::new(ViewId::Classic).snapshot(&AnnotationState::Unavailable);
        apply_ui_update(&mut state, UiUpdate::Game(Box::new(first)));
        apply_ui_update(&mut state, UiUpdate::Game(Box::new(second)));
        assert_eq!(state.active_view(), ViewId::Classic);
    }
}
