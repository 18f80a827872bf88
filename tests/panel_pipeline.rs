//! ---
//! sl_section: "07-testing"
//! sl_subsection: "integration-tests"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "End-to-end tests over a mock device."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Full-stack pipeline tests: a mock WebSocket device on one end, the link,
//! dispatcher, reconciliation engine and a recording surface on the other.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use servlink_panel::controls::{CommandPort, Controls, PointerPhase};
use servlink_panel::layout::{LayoutElement, PanelLayout};
use servlink_panel::widgets::{self, SpecialElements};
use servlink_panel::{Dispatcher, Panel, RecordingSurface};
use servlink_proto::{command, Frame};
use servlink_signal::{FormatterRegistry, SignalCatalog, SignalDecoder, SignalRecord};
use servlink_transport::{Link, LinkConfig, LinkState};

#[derive(Clone)]
struct DeviceState {
    inject: broadcast::Sender<String>,
    received: mpsc::UnboundedSender<Frame>,
}

async fn spawn_device() -> (
    SocketAddr,
    broadcast::Sender<String>,
    mpsc::UnboundedReceiver<Frame>,
) {
    let (inject, _) = broadcast::channel(64);
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let state = DeviceState {
        inject: inject.clone(),
        received: received_tx,
    };
    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, inject, received_rx)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<DeviceState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| device_session(socket, state))
}

async fn device_session(mut socket: WebSocket, state: DeviceState) {
    let mut inject = state.inject.subscribe();
    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(frame) = Frame::from_json(&text) {
                            let _ = state.received.send(frame);
                        }
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
            text = inject.recv() => {
                match text {
                    Ok(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

fn link_to(addr: SocketAddr) -> Link {
    Link::spawn(LinkConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        // Keep the session quiet so received frames are ours alone.
        heartbeat_interval: Duration::from_secs(600),
        stale_after: Duration::from_secs(600),
        ..LinkConfig::default()
    })
}

async fn wait_for_open(link: &Link) {
    let mut state = link.watch_state();
    timeout(Duration::from_secs(5), async {
        while *state.borrow() != LinkState::Open {
            state.changed().await.expect("state channel");
        }
    })
    .await
    .expect("link opens");
}

fn inject_frame(inject: &broadcast::Sender<String>, frame: &Frame) {
    inject
        .send(frame.to_json().expect("serializes"))
        .expect("device session running");
}

async fn pump_one(frames: &mut broadcast::Receiver<Frame>, panel: &mut Panel<RecordingSurface>) {
    let frame = timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("frame arrives")
        .expect("subscription open");
    panel.handle_frame(&frame);
}

fn element(id: &str, classes: &[&str], signal: Option<u16>, group: Option<&str>) -> LayoutElement {
    LayoutElement {
        id: id.to_string(),
        classes: classes.iter().map(|c| c.to_string()).collect(),
        signal,
        group: group.map(String::from),
        active_text: None,
        inactive_text: None,
        active_icon: None,
        inactive_icon: None,
        value_display: None,
        tab: None,
        tab_group: None,
    }
}

fn status_frame(signal_id: u16, raw: i32) -> Frame {
    let state = u8::from(raw != 0);
    let mut data = vec![(signal_id & 0xff) as u8, (signal_id >> 8) as u8, state, 0];
    data.extend_from_slice(&raw.to_le_bytes());
    Frame::new(16, 5, data)
}

#[tokio::test]
async fn device_status_updates_reach_the_surface() {
    let (addr, inject, _received) = spawn_device().await;

    let catalog = Arc::new(SignalCatalog::from_records([SignalRecord {
        signal_id: 20,
        data_type: 0,
        description: "house battery amperage".to_string(),
        channel_type: 5,
        data_item_format_type: 6,
        channel_setting_type: 0,
    }]));
    let formatters = Arc::new(FormatterRegistry::new(&catalog));
    let layout = PanelLayout {
        elements: vec![
            element("btn-pump", &["toggle-btn"], Some(10), None),
            element("val-amps", &["signal-value"], Some(20), None),
        ],
    };
    let resolved = layout.resolve();
    let mut dispatcher = Dispatcher::new(SignalDecoder::new(Arc::clone(&catalog)));
    widgets::bind_value_displays(&mut dispatcher, &resolved.values, formatters);
    let mut panel = Panel::new(dispatcher, &resolved, RecordingSurface::new());

    let link = link_to(addr);
    wait_for_open(&link).await;
    let mut frames = link.subscribe_frames();

    inject_frame(&inject, &status_frame(10, 1));
    pump_one(&mut frames, &mut panel).await;
    assert!(panel.surface().has_class("btn-pump", "active"));

    inject_frame(&inject, &status_frame(20, 12_500));
    pump_one(&mut frames, &mut panel).await;
    assert_eq!(panel.surface().text("val-amps"), Some("12.5A"));

    link.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn mode_change_echoes_reconcile_the_radio_group() {
    let (addr, inject, _received) = spawn_device().await;

    let layout = PanelLayout {
        elements: vec![
            element("ac-cool", &["btn-pill--small"], Some(95), Some("ac-mode")),
            element("ac-heat", &["btn-pill--small"], Some(98), Some("ac-mode")),
            element("ac-auto", &["btn-pill--small"], Some(99), Some("ac-mode")),
        ],
    };
    let resolved = layout.resolve();
    let dispatcher = Dispatcher::new(SignalDecoder::new(Arc::new(SignalCatalog::default())));
    let mut panel = Panel::new(dispatcher, &resolved, RecordingSurface::new());

    let link = link_to(addr);
    wait_for_open(&link).await;
    let mut frames = link.subscribe_frames();

    // The device echoes the press but never follows with a status update.
    inject_frame(&inject, &command::momentary(95, true));
    pump_one(&mut frames, &mut panel).await;
    assert!(panel.engine().is_active(95));
    assert!(panel.surface().has_class("ac-cool", "btn-pill--small--active"));

    inject_frame(&inject, &command::momentary(95, false));
    pump_one(&mut frames, &mut panel).await;
    assert!(panel.engine().is_active(95));

    inject_frame(&inject, &command::momentary(98, true));
    pump_one(&mut frames, &mut panel).await;
    assert!(panel.engine().is_active(98));
    assert!(!panel.engine().is_active(95));
    assert!(panel.surface().has_class("ac-heat", "btn-pill--small--active"));
    assert!(panel.surface().has_class("ac-cool", "btn-pill--small--inactive"));

    link.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn pointer_gestures_send_command_frames_to_the_device() {
    let (addr, _inject, mut received) = spawn_device().await;

    let layout = PanelLayout {
        elements: vec![element("btn-pump", &["toggle-btn"], Some(10), None)],
    };
    let resolved = layout.resolve();
    let mut controls = Controls::new(&resolved, SpecialElements::default());
    let mut surface = RecordingSurface::new();

    let link = link_to(addr);
    wait_for_open(&link).await;

    // Drain the two handshake bus subscriptions.
    for _ in 0..2 {
        let frame = timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("handshake frame")
            .expect("device running");
        assert_eq!(frame.message_type, 0x60);
    }

    controls.pointer("btn-pump", PointerPhase::Press, &link, &mut surface);
    controls.pointer("btn-pump", PointerPhase::Release, &link, &mut surface);

    let press = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("press arrives")
        .expect("device running");
    assert_eq!(press, command::momentary(10, true));
    let release = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("release arrives")
        .expect("device running");
    assert_eq!(release, command::momentary(10, false));

    link.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn pulse_release_is_delivered_after_its_delay() {
    let (addr, _inject, mut received) = spawn_device().await;

    let layout = PanelLayout {
        elements: vec![element("btn-horn", &["pulse-btn"], Some(33), None)],
    };
    let resolved = layout.resolve();
    let mut controls = Controls::new(&resolved, SpecialElements::default());
    let mut surface = RecordingSurface::new();

    let link = link_to(addr);
    wait_for_open(&link).await;
    for _ in 0..2 {
        let _ = timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("handshake frame");
    }

    controls.pointer("btn-horn", PointerPhase::Press, &link, &mut surface);

    let press = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("press arrives")
        .expect("device running");
    assert_eq!(press, command::momentary(33, true));
    let release = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("release arrives")
        .expect("device running");
    assert_eq!(release, command::momentary(33, false));

    link.shutdown().await.expect("shutdown");
}

// CommandPort is implemented for Link; assert the trait object path compiles
// and refuses sends once the link is gone.
#[tokio::test]
async fn command_port_refuses_sends_while_closed() {
    let link = Link::spawn(LinkConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..LinkConfig::default()
    });
    let port: &dyn CommandPort = &link;
    assert!(!port.send_frame(command::momentary(10, true)));
    link.shutdown().await.expect("shutdown");
}
