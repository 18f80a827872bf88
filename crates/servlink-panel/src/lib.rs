//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Panel state and UI binding.
//!
//! This crate turns classified wire frames into surface mutations: a
//! dispatcher fans decoded signals out to subscribers, a reconciliation
//! engine keeps button and indicator state consistent (including the
//! command-echo workaround for the air-conditioning signal range), and the
//! controls layer translates pointer, slider and modal input back into
//! command frames. The surface itself sits behind a trait so nothing here
//! knows about a concrete frontend.

#![warn(missing_docs)]

pub mod controls;
pub mod dispatch;
pub mod engine;
pub mod layout;
pub mod panel;
pub mod surface;
pub mod widgets;

use thiserror::Error;

pub use controls::{CommandPort, Controls, PointerPhase};
pub use dispatch::{Dispatcher, SignalCallback, SignalClass};
pub use engine::{StateEngine, AC_MODE_GROUP, AC_SIGNAL_RANGE, FAN_MODE_GROUP};
pub use layout::{ButtonKind, PanelLayout, ResolvedLayout};
pub use panel::Panel;
pub use surface::{ElementRef, RecordingSurface, Surface};
pub use widgets::SpecialElements;

/// Errors raised while loading panel resources.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A layout file could not be read.
    #[error("failed to read layout: {0}")]
    Io(#[from] std::io::Error),
    /// A layout file could not be parsed.
    #[error("failed to parse layout: {0}")]
    Parse(#[from] serde_json::Error),
}
