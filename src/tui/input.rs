// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (cursor movement).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::cell::{CELL_COUNT, GRID_SIZE};
use crate::protocol::{UserCommand, ViewId};

use super::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to
/// the app orchestrator (toggle, view switch, refresh, quit). Returns
/// `None` when the key was handled locally by mutating `ViewState`
/// (cursor movement) or was not bound.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately (escape hatch).
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UserCommand::Quit),

        // View switching
        KeyCode::Char('1') => Some(UserCommand::SwitchView(ViewId::Classic)),
        KeyCode::Char('2') => Some(UserCommand::SwitchView(ViewId::Ore)),
        KeyCode::Char('3') => Some(UserCommand::SwitchView(ViewId::Orb)),

        // Cursor movement over the grid (wrapping)
        KeyCode::Left | KeyCode::Char('h') => {
            view_state.cursor = move_left(view_state.cursor);
            None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            view_state.cursor = move_right(view_state.cursor);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.cursor = move_up(view_state.cursor);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_state.cursor = move_down(view_state.cursor);
            None
        }

        // Toggle the prediction under the cursor
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserCommand::ToggleCell(view_state.cursor)),

        // Re-fetch tile annotations
        KeyCode::Char('r') => Some(UserCommand::RefreshAnnotations),

        _ => None,
    }
}

fn move_left(cursor: usize) -> usize {
    if cursor % GRID_SIZE == 0 {
        cursor + GRID_SIZE - 1
    } else {
        cursor - 1
    }
}

fn move_right(cursor: usize) -> usize {
    if cursor % GRID_SIZE == GRID_SIZE - 1 {
        cursor + 1 - GRID_SIZE
    } else {
        cursor + 1
    }
}

fn move_up(cursor: usize) -> usize {
    (cursor + CELL_COUNT - GRID_SIZE) % CELL_COUNT
}

fn move_down(cursor: usize) -> usize {
    (cursor + GRID_SIZE) % CELL_COUNT
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(press(KeyCode::Char('q')), &mut state),
            Some(UserCommand::Quit)
        );
        assert_eq!(
            handle_key(press(KeyCode::Esc), &mut state),
            Some(UserCommand::Quit)
        );
        assert_eq!(
            handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &mut state
            ),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn number_keys_switch_views() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(press(KeyCode::Char('1')), &mut state),
            Some(UserCommand::SwitchView(ViewId::Classic))
        );
        assert_eq!(
            handle_key(press(KeyCode::Char('2')), &mut state),
            Some(UserCommand::SwitchView(ViewId::Ore))
        );
        assert_eq!(
            handle_key(press(KeyCode::Char('3')), &mut state),
            Some(UserCommand::SwitchView(ViewId::Orb))
        );
    }

    #[test]
    fn cursor_moves_and_wraps() {
        let mut state = ViewState::default();
        assert_eq!(state.cursor, 0);

        assert_eq!(handle_key(press(KeyCode::Right), &mut state), None);
        assert_eq!(state.cursor, 1);
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(state.cursor, 6);
        handle_key(press(KeyCode::Left), &mut state);
        assert_eq!(state.cursor, 5);
        handle_key(press(KeyCode::Up), &mut state);
        assert_eq!(state.cursor, 0);

        // Wrap left within the row, up across the grid.
        handle_key(press(KeyCode::Left), &mut state);
        assert_eq!(state.cursor, 4);
        state.cursor = 0;
        handle_key(press(KeyCode::Up), &mut state);
        assert_eq!(state.cursor, 20);
        state.cursor = 24;
        handle_key(press(KeyCode::Right), &mut state);
        assert_eq!(state.cursor, 20);
        state.cursor = 22;
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(state.cursor, 2);
    }

    #[test]
    fn enter_and_space_toggle_cursor_cell() {
        let mut state = ViewState::default();
        state.cursor = 7;
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            Some(UserCommand::ToggleCell(7))
        );
        assert_eq!(
            handle_key(press(KeyCode::Char(' ')), &mut state),
            Some(UserCommand::ToggleCell(7))
        );
    }

    #[test]
    fn refresh_key() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(press(KeyCode::Char('r')), &mut state),
            Some(UserCommand::RefreshAnnotations)
        );
    }

    #[test]
    fn release_events_ignored() {
        let mut state = ViewState::default();
        let mut event = press(KeyCode::Char('q'));
        event.kind = KeyEventKind::Release;
        assert_eq!(handle_key(event, &mut state), None);
    }

    #[test]
    fn unbound_keys_ignored() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(press(KeyCode::Char('z')), &mut state), None);
        assert_eq!(state.cursor, 0);
    }
}
