// Application state and orchestration logic.
//
// The central event loop that coordinates WebSocket events from the game
// feed, annotation fetch results, and user commands from the TUI. All
// state mutation happens here, in event-arrival order, so no other task
// ever touches the store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::annotations::{spawn_fetch, AnnotationEvent, AnnotationFetcher, AnnotationState};
use crate::config::Config;
use crate::game::state::{FrameOutcome, GameStore};
use crate::protocol::{ClientMessage, ConnectionStatus, UiUpdate, UserCommand, ViewId};
use crate::ws_client::{spawn_connection, ConnectionHandle, WsEvent};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub store: GameStore,
    /// The view currently shown; frames from its connection feed its state.
    pub active_view: ViewId,
    pub connection_status: ConnectionStatus,
    pub annotations: AnnotationState,
    /// Handle to the live connection session, when one exists.
    pub session: Option<ConnectionHandle>,
    /// Generation of the current session. Events tagged with an older
    /// generation belong to a torn-down session and are discarded.
    pub session_generation: u64,
    /// Generation of the most recent annotation fetch; stale responses
    /// are discarded the same way.
    pub annotation_generation: u64,
    fetcher: Arc<AnnotationFetcher>,
    ws_tx: mpsc::Sender<WsEvent>,
    annot_tx: mpsc::Sender<AnnotationEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        ws_tx: mpsc::Sender<WsEvent>,
        annot_tx: mpsc::Sender<AnnotationEvent>,
    ) -> Self {
        let fetcher = Arc::new(AnnotationFetcher::new(&config.api.base_url));
        AppState {
            config,
            store: GameStore::new(),
            active_view: ViewId::Classic,
            connection_status: ConnectionStatus::Disconnected,
            annotations: AnnotationState::Pending,
            session: None,
            session_generation: 0,
            annotation_generation: 0,
            fetcher,
            ws_tx,
            annot_tx,
        }
    }

    /// (Re)connect to the active view's endpoint.
    ///
    /// Any previous session is shut down first; its pending reconnect
    /// timers and in-flight events die with its generation.
    pub fn connect_active_view(&mut self) {
        if let Some(old) = self.session.take() {
            old.shutdown();
        }
        self.session_generation += 1;
        let url = self.config.endpoint(self.active_view).to_string();
        info!(view = self.active_view.label(), %url, "opening connection session");
        self.session = Some(spawn_connection(
            url,
            &self.config.backoff,
            self.session_generation,
            self.ws_tx.clone(),
        ));
        self.connection_status = ConnectionStatus::Disconnected;
    }

    /// Kick off a one-shot annotation fetch.
    pub fn request_annotations(&mut self) {
        self.annotation_generation += 1;
        spawn_fetch(
            self.fetcher.clone(),
            self.annot_tx.clone(),
            self.annotation_generation,
        );
    }

    /// Whether a toggle for `index` should go out: the socket must be
    /// open, the index on the grid, and the cell enabled.
    pub fn can_toggle(&self, index: usize) -> bool {
        if self.connection_status != ConnectionStatus::Connected {
            return false;
        }
        match self.store.state(self.active_view).grid.get(index) {
            Some(cell) => !cell.disabled,
            None => false,
        }
    }

    /// Process one WebSocket event. Stale-generation events are dropped.
    pub async fn handle_ws_event(&mut self, event: WsEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
        let generation = match &event {
            WsEvent::Connected { generation }
            | WsEvent::Disconnected { generation }
            | WsEvent::Frame { generation, .. } => *generation,
        };
        if generation != self.session_generation {
            debug!(
                generation,
                current = self.session_generation,
                "dropping event from stale session"
            );
            return;
        }

        match event {
            WsEvent::Connected { .. } => {
                info!(view = self.active_view.label(), "feed connected");
                self.connection_status = ConnectionStatus::Connected;
                let _ = ui_tx
                    .send(UiUpdate::ConnectionStatus(ConnectionStatus::Connected))
                    .await;
            }
            WsEvent::Disconnected { .. } => {
                info!(view = self.active_view.label(), "feed disconnected");
                self.connection_status = ConnectionStatus::Disconnected;
                let _ = ui_tx
                    .send(UiUpdate::ConnectionStatus(ConnectionStatus::Disconnected))
                    .await;
            }
            WsEvent::Frame { raw, .. } => {
                match self.store.apply_frame(self.active_view, &raw) {
                    FrameOutcome::Applied => self.push_game(ui_tx).await,
                    FrameOutcome::RefreshAnnotations => {
                        self.request_annotations();
                        self.push_game(ui_tx).await;
                    }
                    FrameOutcome::Discarded => {}
                }
            }
        }
    }

    /// Process one annotation fetch result. Stale generations are dropped
    /// so a slow response never clobbers a newer one.
    pub async fn handle_annotation_event(
        &mut self,
        event: AnnotationEvent,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) {
        let (generation, next) = match event {
            AnnotationEvent::Loaded { tiles, generation } => {
                (generation, AnnotationState::Available(tiles))
            }
            AnnotationEvent::Failed { generation } => (generation, AnnotationState::Unavailable),
        };
        if generation != self.annotation_generation {
            debug!(
                generation,
                current = self.annotation_generation,
                "dropping stale annotation result"
            );
            return;
        }
        self.annotations = next;
        self.push_game(ui_tx).await;
    }

    /// Process one user command from the TUI.
    pub async fn handle_user_command(&mut self, cmd: UserCommand, ui_tx: &mpsc::Sender<UiUpdate>) {
        match cmd {
            UserCommand::ToggleCell(index) => {
                if !self.can_toggle(index) {
                    debug!(index, "toggle suppressed (disconnected or cell disabled)");
                    return;
                }
                if let Some(session) = &self.session {
                    session.send(ClientMessage::Toggle { index });
                }
            }
            UserCommand::SwitchView(view) => {
                if view == self.active_view {
                    return;
                }
                info!(from = self.active_view.label(), to = view.label(), "switching view");
                self.active_view = view;
                self.connect_active_view();
                let _ = ui_tx
                    .send(UiUpdate::ConnectionStatus(ConnectionStatus::Disconnected))
                    .await;
                self.push_game(ui_tx).await;
            }
            UserCommand::RefreshAnnotations => {
                self.request_annotations();
            }
            // Quit is consumed by the event loop before reaching here.
            UserCommand::Quit => {}
        }
    }

    /// Push a fresh snapshot of the active view to the TUI.
    pub async fn push_game(&self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let snapshot = self
            .store
            .state(self.active_view)
            .snapshot(&self.annotations);
        let _ = ui_tx.send(UiUpdate::Game(Box::new(snapshot))).await;
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until the user quits or every input
/// channel closes.
pub async fn run(
    mut ws_rx: mpsc::Receiver<WsEvent>,
    mut annot_rx: mpsc::Receiver<AnnotationEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("application event loop started");

    state.connect_active_view();
    state.request_annotations();
    state.push_game(&ui_tx).await;

    loop {
        tokio::select! {
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(event) => state.handle_ws_event(event, &ui_tx).await,
                    None => {
                        info!("websocket channel closed, shutting down");
                        break;
                    }
                }
            }

            annot_event = annot_rx.recv() => {
                match annot_event {
                    Some(event) => state.handle_annotation_event(event, &ui_tx).await,
                    None => {
                        info!("annotation channel closed, shutting down");
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => state.handle_user_command(cmd, &ui_tx).await,
                    None => {
                        info!("command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    if let Some(session) = state.session.take() {
        session.shutdown();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
