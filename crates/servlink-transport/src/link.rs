//! ---
//! sl_section: "03-transport"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Supervised WebSocket link to the panel device."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info, warn};

use servlink_proto::command::{self, BusClass};
use servlink_proto::{classify, Frame, FrameKind};

use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Host used when no page/device host is configured.
pub const FALLBACK_HOST: &str = "172.16.11.7";

/// Authoritative connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No connection and none being attempted.
    #[default]
    Closed,
    /// A dial is in progress.
    Connecting,
    /// Connected; heartbeat and watchdog are running.
    Open,
    /// The last dial or session failed; a reconnect follows.
    Error,
}

/// Link configuration. Intervals default to the device contract and are
/// adjustable so tests can compress time.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Device host name or address.
    pub host: String,
    /// Device WebSocket port.
    pub port: u16,
    /// WebSocket endpoint path.
    pub path: String,
    /// Delay between the socket opening and the subscription handshake.
    pub handshake_delay: Duration,
    /// Client heartbeat period while open.
    pub heartbeat_interval: Duration,
    /// Watchdog tick period.
    pub watchdog_interval: Duration,
    /// Quiet time after which the watchdog forces a reconnect.
    pub stale_after: Duration,
    /// Pause before redialling after a failed dial.
    pub redial_delay: Duration,
    /// Pre-baked bulk subscription payload, sent verbatim after the two
    /// fixed bus subscriptions. `None` sends the bus subscriptions only.
    pub subscription_script: Option<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: FALLBACK_HOST.to_string(),
            port: 8888,
            path: "/ws".to_string(),
            handshake_delay: Duration::from_millis(50),
            heartbeat_interval: Duration::from_secs(5),
            watchdog_interval: Duration::from_secs(2),
            stale_after: Duration::from_secs(10),
            redial_delay: Duration::from_millis(250),
            subscription_script: None,
        }
    }
}

impl LinkConfig {
    /// Endpoint URL the link dials.
    pub fn endpoint(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

enum SessionEnd {
    Shutdown,
    Stale,
    Closed,
    Failed,
}

/// Handle to the supervised link task.
///
/// Cloned handles are not needed: frame subscribers hold broadcast
/// receivers and state observers hold watch receivers, both detached from
/// the handle's lifetime.
pub struct Link {
    frames: broadcast::Sender<Frame>,
    state_rx: watch::Receiver<LinkState>,
    out_tx: mpsc::UnboundedSender<Frame>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Link {
    /// Spawn the link supervisor. Dialling begins immediately.
    pub fn spawn(config: LinkConfig) -> Self {
        let (frames, _) = broadcast::channel(256);
        let (state_tx, state_rx) = watch::channel(LinkState::Closed);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(supervise(
            config,
            frames.clone(),
            state_tx,
            out_rx,
            shutdown_rx,
        ));

        Self {
            frames,
            state_rx,
            out_tx,
            shutdown_tx,
            task,
        }
    }

    /// Subscribe to parsed inbound frames. Dropping the receiver is the
    /// unsubscribe; each receiver sees frames in arrival order.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Observe connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    /// Queue a frame for transmission. Returns `false` when the link is not
    /// open; never panics.
    pub fn send(&self, frame: Frame) -> bool {
        if self.state() != LinkState::Open {
            debug!(
                message_type = frame.message_type,
                message_cmd = frame.message_cmd,
                "send refused; link not open"
            );
            return false;
        }
        self.out_tx.send(frame).is_ok()
    }

    /// Sender half usable from detached tasks (timed pulse releases).
    pub fn raw_sender(&self) -> mpsc::UnboundedSender<Frame> {
        self.out_tx.clone()
    }

    /// Close the connection, cancel both supervision timers and stop the
    /// supervisor task.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.task.await.map_err(anyhow::Error::from)
    }
}

async fn supervise(
    config: LinkConfig,
    frames: broadcast::Sender<Frame>,
    state_tx: watch::Sender<LinkState>,
    mut out_rx: mpsc::UnboundedReceiver<Frame>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let endpoint = config.endpoint();
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        state_tx.send_replace(LinkState::Connecting);
        match connect_async(&endpoint).await {
            Ok((socket, _response)) => {
                info!(endpoint = %endpoint, "link established");
                state_tx.send_replace(LinkState::Open);
                let end = run_session(&config, socket, &frames, &mut out_rx, &mut shutdown_rx).await;
                match end {
                    SessionEnd::Shutdown => {
                        state_tx.send_replace(LinkState::Closed);
                        break;
                    }
                    SessionEnd::Stale => {
                        warn!(endpoint = %endpoint, "watchdog timeout; reconnecting");
                        state_tx.send_replace(LinkState::Closed);
                    }
                    SessionEnd::Closed => {
                        info!(endpoint = %endpoint, "link closed by peer; reconnecting");
                        state_tx.send_replace(LinkState::Closed);
                    }
                    SessionEnd::Failed => {
                        state_tx.send_replace(LinkState::Error);
                    }
                }
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "dial failed");
                state_tx.send_replace(LinkState::Error);
                tokio::select! {
                    _ = sleep(config.redial_delay) => {}
                    _ = shutdown_rx.changed() => {}
                }
            }
        }
    }
    state_tx.send_replace(LinkState::Closed);
}

async fn run_session(
    config: &LinkConfig,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    frames: &broadcast::Sender<Frame>,
    out_rx: &mut mpsc::UnboundedReceiver<Frame>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();
    let mut last_rx = Instant::now();
    let mut handshake_done = false;
    let handshake = sleep(config.handshake_delay);
    tokio::pin!(handshake);

    let start = Instant::now();
    let mut heartbeat = interval_at(start + config.heartbeat_interval, config.heartbeat_interval);
    let mut watchdog = interval_at(start + config.watchdog_interval, config.watchdog_interval);

    loop {
        tokio::select! {
            _ = &mut handshake, if !handshake_done => {
                handshake_done = true;
                if let Err(end) = send_handshake(config, &mut sink).await {
                    return end;
                }
            }
            message = stream.next() => {
                match message {
                    None | Some(Ok(Message::Close(_))) => return SessionEnd::Closed,
                    Some(Err(err)) => {
                        warn!(error = %err, "link read error");
                        return SessionEnd::Failed;
                    }
                    Some(Ok(Message::Text(text))) => {
                        last_rx = Instant::now();
                        if let Err(end) = handle_text(&text, frames, &mut sink).await {
                            return end;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        last_rx = Instant::now();
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            return SessionEnd::Failed;
                        }
                    }
                    Some(Ok(_)) => {
                        last_rx = Instant::now();
                    }
                }
            }
            _ = heartbeat.tick() => {
                if let Err(end) = send_frame(&mut sink, &command::heartbeat()).await {
                    return end;
                }
            }
            _ = watchdog.tick() => {
                if last_rx.elapsed() > config.stale_after {
                    return SessionEnd::Stale;
                }
            }
            outbound = out_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if let Err(end) = send_frame(&mut sink, &frame).await {
                            return end;
                        }
                    }
                    None => return SessionEnd::Shutdown,
                }
            }
            _ = shutdown_rx.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }
        }
    }
}

/// Parse one inbound text message; answer heartbeat requests directly and
/// fan everything else out. Unparseable payloads are logged and dropped.
async fn handle_text(
    text: &str,
    frames: &broadcast::Sender<Frame>,
    sink: &mut WsSink,
) -> Result<(), SessionEnd> {
    match Frame::from_json(text) {
        Ok(frame) => {
            if classify(&frame) == FrameKind::HeartbeatRequest {
                debug!("device heartbeat received; acknowledging");
                send_frame(sink, &command::heartbeat_ack()).await?;
                return Ok(());
            }
            // Receiver errors only mean nobody is listening right now.
            let _ = frames.send(frame);
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "dropping unparseable frame");
            Ok(())
        }
    }
}

async fn send_handshake(config: &LinkConfig, sink: &mut WsSink) -> Result<(), SessionEnd> {
    send_frame(sink, &command::subscribe_bus(BusClass::Mfd)).await?;
    send_frame(sink, &command::subscribe_bus(BusClass::Nmea)).await?;
    if let Some(script) = &config.subscription_script {
        debug!(bytes = script.len(), "sending bulk channel subscription");
        if sink.send(Message::Text(script.clone())).await.is_err() {
            return Err(SessionEnd::Failed);
        }
    }
    Ok(())
}

async fn send_frame(sink: &mut WsSink, frame: &Frame) -> Result<(), SessionEnd> {
    let text = match frame.to_json() {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "failed to serialise outbound frame");
            return Ok(());
        }
    };
    debug!(tx = %text, "frame sent");
    sink.send(Message::Text(text))
        .await
        .map_err(|err| {
            warn!(error = %err, "link write error");
            SessionEnd::Failed
        })
}
