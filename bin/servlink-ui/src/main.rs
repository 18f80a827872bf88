//! ---
//! sl_section: "06-client"
//! sl_subsection: "binary"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Panel client entrypoint and surface wiring."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use servlink_common::config::AppConfig;
use servlink_common::logging::init_tracing;
use servlink_panel::widgets::{self, SpecialElements};
use servlink_panel::{Dispatcher, ElementRef, Panel, PanelLayout};
use servlink_signal::{FormatterRegistry, SignalCatalog, SignalDecoder};
use servlink_transport::{Link, LinkConfig};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

mod journal;

use journal::JournalSurface;

#[derive(Debug, Parser)]
#[command(author, version, about = "CORE panel client", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the device host")]
    host: Option<String>,

    #[arg(long, help = "Override the device port")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/servlink.toml"));
    candidates.push(PathBuf::from("configs/servlink.dev.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let config = loaded.config;
    init_tracing("servlink-ui", &config.logging)?;
    info!(config_path = %loaded.source.display(), "configuration loaded");

    let catalog = Arc::new(SignalCatalog::load_or_default(&config.metadata.signal_info_path));
    info!(signals = catalog.len(), "signal catalog ready");
    let formatters = Arc::new(FormatterRegistry::new(&catalog));

    let layout = PanelLayout::from_path(&config.layout.path)
        .with_context(|| format!("loading layout {}", config.layout.path.display()))?;
    let resolved = layout.resolve();
    info!(
        buttons = resolved.buttons.len(),
        indicators = resolved.indicators.len(),
        values = resolved.values.len(),
        "layout resolved"
    );

    let special = standard_special_elements();
    let mut dispatcher = Dispatcher::new(SignalDecoder::new(Arc::clone(&catalog)));
    widgets::bind_value_displays(&mut dispatcher, &resolved.values, Arc::clone(&formatters));
    widgets::bind_gauges(&mut dispatcher, &resolved.gauges);
    widgets::bind_special(&mut dispatcher, &special);

    let mut panel = Panel::new(dispatcher, &resolved, JournalSurface::new());

    let subscription_script = match &config.link.subscription_script {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading subscription script {}", path.display()))?,
        ),
        None => None,
    };
    let link = Link::spawn(LinkConfig {
        host: cli.host.unwrap_or(config.link.host),
        port: cli.port.unwrap_or(config.link.port),
        path: config.link.path,
        handshake_delay: config.link.handshake_delay,
        heartbeat_interval: config.link.heartbeat_interval,
        watchdog_interval: config.link.watchdog_interval,
        stale_after: config.link.stale_after,
        subscription_script,
        ..LinkConfig::default()
    });

    let mut frames = link.subscribe_frames();
    let mut state_rx = link.watch_state();
    info!("panel client running; waiting for termination signal");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("ctrl-c received; shutting down");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow();
                info!(?state, "link state changed");
                widgets::apply_link_state(panel.surface_mut(), &special, state);
            }
            frame = frames.recv() => {
                match frame {
                    Ok(frame) => panel.handle_frame(&frame),
                    Err(RecvError::Lagged(dropped)) => {
                        warn!(dropped, "frame subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    link.shutdown().await?;
    Ok(())
}

/// The fixed element ids the standard panel layout uses for its
/// special-cased widgets.
fn standard_special_elements() -> SpecialElements {
    SpecialElements {
        generator_icon: Some(ElementRef::new("generator-charge-icon")),
        interior_temp: Some(ElementRef::new("interior-temp-deg")),
        target_temp: Some(ElementRef::new("target-temp-deg")),
        target_temp_slider: Some(ElementRef::new("target-temp-slider")),
        ac_limit_value: Some(ElementRef::new("current-ac-limit")),
        ac_limit_modal: Some(ElementRef::new("ac-limit-modal")),
        ac_limit_selection: Some(ElementRef::new("ac-limit-selection")),
        connection_status: Some(ElementRef::new("connection-status")),
        connect_btn: Some(ElementRef::new("btn-connect")),
        disconnect_btn: Some(ElementRef::new("btn-disconnect")),
    }
}
