// Reconnecting WebSocket client for the game feed.
//
// One task owns one logical connection session: it dials the endpoint,
// forwards inbound text frames to the orchestrator, writes outbound
// commands, and on any close or transport error retries forever with
// capped exponential backoff. A watch-channel shutdown token suppresses
// reconnects and all further event emission once the owning view is torn
// down.

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::config::BackoffConfig;
use crate::protocol::ClientMessage;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by a connection session to the orchestrator.
///
/// Every event carries the session `generation` so events from a torn-down
/// session that race a view switch can be discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// The socket opened successfully.
    Connected { generation: u64 },
    /// The socket closed (error or server-initiated); a reconnect is
    /// already scheduled.
    Disconnected { generation: u64 },
    /// A raw text frame arrived.
    Frame { raw: String, generation: u64 },
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Capped exponential reconnect backoff.
///
/// The n-th consecutive delay is `min(ceiling, base * factor^(n-1))`;
/// `reset` returns to the base delay after a successful open.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: f64,
    factor: f64,
    ceiling_ms: f64,
    current_ms: f64,
}

impl Backoff {
    pub fn new(cfg: &BackoffConfig) -> Self {
        Backoff {
            base_ms: cfg.base_ms as f64,
            factor: cfg.factor,
            ceiling_ms: cfg.ceiling_ms as f64,
            current_ms: cfg.base_ms as f64,
        }
    }

    /// The delay to wait before the next attempt; grows the delay for the
    /// attempt after this one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_ms as u64);
        self.current_ms = (self.current_ms * self.factor).min(self.ceiling_ms);
        delay
    }

    /// Reset to the base delay (successful open).
    pub fn reset(&mut self) {
        self.current_ms = self.base_ms;
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owner-side handle to a connection session.
///
/// Dropping the handle has the same effect as calling [`shutdown`]:
/// the session task stops without reconnecting.
///
/// [`shutdown`]: ConnectionHandle::shutdown
#[derive(Debug)]
pub struct ConnectionHandle {
    out_tx: mpsc::Sender<ClientMessage>,
    shutdown_tx: watch::Sender<bool>,
    generation: u64,
}

impl ConnectionHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand a message to the session for sending. Messages are dropped,
    /// not queued, when the socket is closed or the channel is full.
    pub fn send(&self, msg: ClientMessage) {
        if let Err(err) = self.out_tx.try_send(msg) {
            debug!(%err, "dropping outbound message");
        }
    }

    /// Tear the session down: close the socket and suppress any further
    /// reconnects or event emission.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Spawn a connection session task for `url` and return its handle.
pub fn spawn_connection(
    url: String,
    backoff: &BackoffConfig,
    generation: u64,
    event_tx: mpsc::Sender<WsEvent>,
) -> ConnectionHandle {
    let (out_tx, out_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cfg = backoff.clone();
    tokio::spawn(run_connection(
        url,
        cfg,
        generation,
        event_tx,
        out_rx,
        shutdown_rx,
    ));
    ConnectionHandle {
        out_tx,
        shutdown_tx,
        generation,
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// Why a live session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The socket closed or errored; the caller should reconnect.
    Closed,
    /// The shutdown token fired; no reconnect.
    ShutDown,
    /// The orchestrator went away; no reconnect.
    ChannelClosed,
}

/// The reconnect loop: dial, run the session, back off, repeat.
async fn run_connection(
    url: String,
    cfg: BackoffConfig,
    generation: u64,
    event_tx: mpsc::Sender<WsEvent>,
    mut out_rx: mpsc::Receiver<ClientMessage>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(&cfg);
    loop {
        if *shutdown_rx.borrow() {
            return;
        }
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws, _response)) => {
                info!(%url, generation, "websocket connected");
                backoff.reset();
                if event_tx
                    .send(WsEvent::Connected { generation })
                    .await
                    .is_err()
                {
                    return;
                }
                let (mut write, read) = ws.split();
                // Ask the server for the initial grid state.
                match serde_json::to_string(&ClientMessage::GetInit) {
                    Ok(raw) => {
                        if let Err(err) = write.send(Message::text(raw)).await {
                            warn!(%err, "failed to send get_init");
                        }
                    }
                    Err(err) => warn!(%err, "failed to encode get_init"),
                }

                let end = run_session(
                    read,
                    &mut write,
                    &mut out_rx,
                    &event_tx,
                    &mut shutdown_rx,
                    generation,
                )
                .await;
                let _ = write.close().await;
                match end {
                    SessionEnd::Closed => {
                        if event_tx
                            .send(WsEvent::Disconnected { generation })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    SessionEnd::ShutDown | SessionEnd::ChannelClosed => return,
                }
            }
            Err(err) => {
                warn!(%err, %url, "websocket connect failed");
            }
        }

        let delay = backoff.next_delay();
        debug!(?delay, %url, "scheduling reconnect");
        if !sleep_through_backoff(delay, &mut out_rx, &mut shutdown_rx).await {
            return;
        }
    }
}

/// Wait out the backoff delay. Outbound messages arriving while the socket
/// is closed are dropped rather than queued. Returns false when the
/// session should stop instead of reconnecting.
async fn sleep_through_backoff(
    delay: Duration,
    out_rx: &mut mpsc::Receiver<ClientMessage>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return false;
                }
            }
            maybe = out_rx.recv() => match maybe {
                Some(msg) => debug!(?msg, "socket closed, dropping outbound message"),
                None => return false,
            },
        }
    }
}

/// Pump one live session: forward inbound text frames, write outbound
/// commands, watch the shutdown token.
///
/// Generic over the stream and sink halves so it can be unit-tested with
/// in-memory streams without opening sockets.
async fn run_session<R, W>(
    mut read: R,
    write: &mut W,
    out_rx: &mut mpsc::Receiver<ClientMessage>,
    event_tx: &mpsc::Sender<WsEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
    generation: u64,
) -> SessionEnd
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
    W: Sink<Message, Error = WsError> + Unpin,
{
    loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let event = WsEvent::Frame { raw: text.to_string(), generation };
                    if event_tx.send(event).await.is_err() {
                        return SessionEnd::ChannelClosed;
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("server sent close frame");
                    return SessionEnd::Closed;
                }
                Some(Ok(_)) => {
                    // Ignore Binary, Ping, Pong, Frame variants.
                }
                Some(Err(err)) => {
                    warn!(%err, "websocket error, closing session");
                    return SessionEnd::Closed;
                }
                None => return SessionEnd::Closed,
            },
            outbound = out_rx.recv() => match outbound {
                Some(msg) => {
                    let raw = match serde_json::to_string(&msg) {
                        Ok(raw) => raw,
                        Err(err) => {
                            warn!(%err, "failed to encode outbound message");
                            continue;
                        }
                    };
                    if let Err(err) = write.send(Message::text(raw)).await {
                        warn!(%err, "websocket send failed, closing session");
                        return SessionEnd::Closed;
                    }
                }
                None => return SessionEnd::ChannelClosed,
            },
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return SessionEnd::ShutDown;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    fn backoff_config() -> BackoffConfig {
        BackoffConfig {
            base_ms: 1000,
            factor: 1.5,
            ceiling_ms: 30_000,
        }
    }

    /// Sink that records every sent message.
    #[derive(Default)]
    struct CaptureSink {
        sent: Vec<Message>,
    }

    impl Sink<Message> for CaptureSink {
        type Error = WsError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Ready(Ok(()))
        }
        fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), WsError> {
            self.sent.push(item);
            Ok(())
        }
        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Ready(Ok(()))
        }
        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Ready(Ok(()))
        }
    }

    fn session_channels() -> (
        mpsc::Sender<ClientMessage>,
        mpsc::Receiver<ClientMessage>,
        mpsc::Sender<WsEvent>,
        mpsc::Receiver<WsEvent>,
        watch::Sender<bool>,
        watch::Receiver<bool>,
    ) {
        let (out_tx, out_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (out_tx, out_rx, event_tx, event_rx, shutdown_tx, shutdown_rx)
    }

    #[test]
    fn backoff_sequence_grows_and_caps() {
        let mut backoff = Backoff::new(&backoff_config());
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1500));
        assert_eq!(backoff.next_delay(), Duration::from_millis(2250));
        // Exhaust growth; the delay must settle at the ceiling.
        for _ in 0..20 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_millis(30_000));
    }

    #[test]
    fn backoff_matches_closed_form() {
        let cfg = backoff_config();
        let mut backoff = Backoff::new(&cfg);
        for n in 1..=12u32 {
            let expected = (cfg.base_ms as f64 * cfg.factor.powi(n as i32 - 1))
                .min(cfg.ceiling_ms as f64) as u64;
            assert_eq!(
                backoff.next_delay(),
                Duration::from_millis(expected),
                "attempt {n}"
            );
        }
    }

    #[test]
    fn backoff_resets_to_base() {
        let mut backoff = Backoff::new(&backoff_config());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn session_forwards_text_frames_in_order() {
        let (_out_tx, mut out_rx, event_tx, mut event_rx, _sd_tx, mut sd_rx) = session_channels();
        let read = stream::iter(vec![
            Ok(Message::Text("first".into())),
            Ok(Message::Text("second".into())),
        ]);
        let mut sink = CaptureSink::default();

        let end = run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 3).await;
        assert_eq!(end, SessionEnd::Closed);

        assert_eq!(
            event_rx.recv().await.unwrap(),
            WsEvent::Frame { raw: "first".into(), generation: 3 }
        );
        assert_eq!(
            event_rx.recv().await.unwrap(),
            WsEvent::Frame { raw: "second".into(), generation: 3 }
        );
    }

    #[tokio::test]
    async fn session_stops_on_close_frame() {
        let (_out_tx, mut out_rx, event_tx, mut event_rx, _sd_tx, mut sd_rx) = session_channels();
        let read = stream::iter(vec![
            Ok(Message::Text("before".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("after".into())),
        ]);
        let mut sink = CaptureSink::default();

        let end = run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 0).await;
        assert_eq!(end, SessionEnd::Closed);

        assert_eq!(
            event_rx.recv().await.unwrap(),
            WsEvent::Frame { raw: "before".into(), generation: 0 }
        );
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn session_stops_on_transport_error() {
        let (_out_tx, mut out_rx, event_tx, mut event_rx, _sd_tx, mut sd_rx) = session_channels();
        let read = stream::iter(vec![
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("unreachable".into())),
        ]);
        let mut sink = CaptureSink::default();

        let end = run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 0).await;
        assert_eq!(end, SessionEnd::Closed);
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn session_ignores_binary_and_ping() {
        let (_out_tx, mut out_rx, event_tx, mut event_rx, _sd_tx, mut sd_rx) = session_channels();
        let read = stream::iter(vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            Ok(Message::Pong(vec![].into())),
            Ok(Message::Text("kept".into())),
        ]);
        let mut sink = CaptureSink::default();

        run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 0).await;

        assert_eq!(
            event_rx.recv().await.unwrap(),
            WsEvent::Frame { raw: "kept".into(), generation: 0 }
        );
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn session_writes_outbound_commands() {
        let (out_tx, mut out_rx, event_tx, _event_rx, _sd_tx, mut sd_rx) = session_channels();
        // A pending read keeps the session alive until the command channel
        // closes.
        let read = stream::pending();
        let mut sink = CaptureSink::default();

        out_tx
            .send(ClientMessage::Toggle { index: 7 })
            .await
            .unwrap();
        drop(out_tx);

        let end = run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 0).await;
        assert_eq!(end, SessionEnd::ChannelClosed);

        assert_eq!(sink.sent.len(), 1);
        match &sink.sent[0] {
            Message::Text(text) => {
                assert_eq!(text.as_str(), r#"{"type":"toggle","index":7}"#)
            }
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_ends_on_shutdown_token() {
        let (_out_tx, mut out_rx, event_tx, _event_rx, sd_tx, mut sd_rx) = session_channels();
        let read = stream::pending();
        let mut sink = CaptureSink::default();

        sd_tx.send(true).unwrap();
        let end = run_session(read, &mut sink, &mut out_rx, &event_tx, &mut sd_rx, 0).await;
        assert_eq!(end, SessionEnd::ShutDown);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_wait_elapses_and_drops_outbound() {
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let (_sd_tx, mut sd_rx) = watch::channel(false);
        out_tx
            .send(ClientMessage::Toggle { index: 1 })
            .await
            .unwrap();

        let start = tokio::time::Instant::now();
        assert!(sleep_through_backoff(Duration::from_secs(30), &mut out_rx, &mut sd_rx).await);
        assert!(start.elapsed() >= Duration::from_secs(30));
        // The message handed over mid-wait was drained and dropped, not
        // queued for the next session.
        assert!(out_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cuts_backoff_wait_short() {
        let (_out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(4);
        let (sd_tx, mut sd_rx) = watch::channel(false);
        sd_tx.send(true).unwrap();

        let start = tokio::time::Instant::now();
        assert!(!sleep_through_backoff(Duration::from_secs(30), &mut out_rx, &mut sd_rx).await);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn shutdown_during_backoff_prevents_reconnect_and_events() {
        // Nothing listens on port 1, so every dial fails and the task sits
        // in backoff. Shutting down must end the task without any event
        // ever being emitted.
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let handle = spawn_connection(
            "ws://127.0.0.1:1".to_string(),
            &backoff_config(),
            1,
            event_tx,
        );
        handle.shutdown();

        // The task drops its event sender on exit; recv resolves to None
        // without ever yielding Connected.
        assert_eq!(event_rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropping_handle_also_tears_down() {
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let handle = spawn_connection(
            "ws://127.0.0.1:1".to_string(),
            &backoff_config(),
            1,
            event_tx,
        );
        drop(handle);
        assert_eq!(event_rx.recv().await, None);
    }
}
