//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Panel assembly: one inbound frame pipeline over a concrete surface.

use servlink_proto::Frame;
use tracing::debug;

use crate::dispatch::{Dispatcher, SignalCallback, SignalClass};
use crate::engine::StateEngine;
use crate::layout::ResolvedLayout;
use crate::surface::Surface;

/// The inbound half of the panel: reconciliation engine plus dispatcher,
/// applied to an owned surface.
///
/// Frames flow through in order: button-state reconciliation first, then
/// the command-echo workaround (which may inject synthetic status frames),
/// then decoded-signal dispatch. Synthetic frames run the same pipeline but
/// can never synthesize further frames.
pub struct Panel<S: Surface> {
    dispatcher: Dispatcher,
    engine: StateEngine,
    surface: S,
}

impl<S: Surface> Panel<S> {
    /// Assemble the panel over a dispatcher, resolved layout and surface.
    pub fn new(dispatcher: Dispatcher, layout: &ResolvedLayout, surface: S) -> Self {
        Self {
            dispatcher,
            engine: StateEngine::new(layout),
            surface,
        }
    }

    /// Register a decoded-signal subscriber.
    pub fn subscribe(&mut self, signal_id: u16, class: SignalClass, callback: SignalCallback) {
        self.dispatcher.subscribe(signal_id, class, callback);
    }

    /// Apply one frame received from the device.
    pub fn handle_frame(&mut self, frame: &Frame) {
        self.apply(frame, false);
    }

    /// Feed a synthesized frame through the pipeline.
    pub fn inject_synthetic(&mut self, frame: Frame) {
        debug!(
            message_type = frame.message_type,
            message_cmd = frame.message_cmd,
            "injecting synthetic frame"
        );
        self.apply(&frame, true);
    }

    fn apply(&mut self, frame: &Frame, synthetic: bool) {
        self.engine.handle_button_frame(frame, &mut self.surface);
        if !synthetic {
            for sim in self.engine.command_echo_sims(frame) {
                self.apply(&sim, true);
            }
            self.engine.channel_one_echo(frame, &mut self.surface);
        }
        self.dispatcher.route(frame, &mut self.surface);
    }

    /// The reconciliation engine, for state queries.
    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }

    /// Shared view of the surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable view of the surface, for input-side updates.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
