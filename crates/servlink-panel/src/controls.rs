//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Outbound control handling: pointer gestures, sliders, tab strips and the
//! shore-power current-limit modal.
//!
//! Every button is a momentary press/release pair on the wire; latching is
//! the device's job. The pressed visual is applied on press and cleared on
//! release, pointer leave or cancel, and a leave without a preceding press
//! sends nothing.

use std::collections::HashSet;
use std::time::Duration;

use servlink_proto::{command, Frame};
use servlink_transport::Link;
use tracing::debug;

use crate::layout::{ButtonBinding, ButtonKind, ResolvedLayout, SliderBinding, TabBinding};
use crate::surface::Surface;
use crate::widgets::{well_known, SpecialElements};

/// Delay before the automatic release of a pulsed button.
pub const PULSE_RELEASE_DELAY: Duration = Duration::from_millis(100);

/// Lowest selectable shore-power current limit, in amps.
pub const AC_LIMIT_MIN: u8 = 5;
/// Highest selectable shore-power current limit, in amps.
pub const AC_LIMIT_MAX: u8 = 50;
const AC_LIMIT_DEFAULT: u8 = 30;

/// Outbound command sink for the controls layer.
///
/// The production implementation is [`Link`]; tests substitute a recorder.
pub trait CommandPort {
    /// Send a frame now. Returns false when the link refuses it.
    fn send_frame(&self, frame: Frame) -> bool;
    /// Queue a frame to be sent after a delay, surviving the caller's scope.
    fn send_frame_after(&self, frame: Frame, delay: Duration);
}

impl CommandPort for Link {
    fn send_frame(&self, frame: Frame) -> bool {
        self.send(frame)
    }

    fn send_frame_after(&self, frame: Frame, delay: Duration) {
        let sender = self.raw_sender();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(frame);
        });
    }
}

/// Phase of a pointer gesture on a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// Pointer down on the element.
    Press,
    /// Pointer up on the element.
    Release,
    /// Pointer left the element bounds.
    Leave,
    /// The gesture was cancelled by the platform.
    Cancel,
}

/// Translates surface input events into command frames.
pub struct Controls {
    buttons: Vec<ButtonBinding>,
    sliders: Vec<SliderBinding>,
    tabs: Vec<TabBinding>,
    special: SpecialElements,
    pressed: HashSet<String>,
    setpoint_signal: u16,
    ac_limit_selection: u8,
}

impl Controls {
    /// Build the controls layer over the resolved bindings.
    pub fn new(layout: &ResolvedLayout, special: SpecialElements) -> Self {
        Self {
            buttons: layout.buttons.clone(),
            sliders: layout.sliders.clone(),
            tabs: layout.tabs.clone(),
            special,
            pressed: HashSet::new(),
            setpoint_signal: well_known::TEMP_SETPOINT,
            ac_limit_selection: AC_LIMIT_DEFAULT,
        }
    }

    /// Override which slider signal mirrors into the target temperature
    /// readout.
    pub fn with_setpoint_signal(mut self, signal_id: u16) -> Self {
        self.setpoint_signal = signal_id;
        self
    }

    /// Currently selected (not necessarily applied) current limit.
    pub fn ac_limit_selection(&self) -> u8 {
        self.ac_limit_selection
    }

    /// Handle one pointer gesture phase on a button element.
    pub fn pointer(
        &mut self,
        element_id: &str,
        phase: PointerPhase,
        port: &dyn CommandPort,
        surface: &mut dyn Surface,
    ) {
        let Some(binding) = self
            .buttons
            .iter()
            .find(|b| b.element.id() == element_id)
            .cloned()
        else {
            return;
        };
        match phase {
            PointerPhase::Press => self.press(&binding, port, surface),
            PointerPhase::Release | PointerPhase::Leave | PointerPhase::Cancel => {
                self.release(&binding, port, surface);
            }
        }
    }

    fn press(&mut self, binding: &ButtonBinding, port: &dyn CommandPort, surface: &mut dyn Surface) {
        self.pressed.insert(binding.element.id().to_string());
        surface.add_class(&binding.element, binding.kind.pressed_class());
        match binding.kind {
            // MultiPlus controls use the latching toggle command; a single
            // press is the whole gesture on the wire.
            ButtonKind::MultiPlus => {
                port.send_frame(command::toggle(binding.signal_id));
            }
            ButtonKind::Pulse => {
                port.send_frame(command::momentary(binding.signal_id, true));
                port.send_frame_after(
                    command::momentary(binding.signal_id, false),
                    PULSE_RELEASE_DELAY,
                );
            }
            _ => {
                port.send_frame(command::momentary(binding.signal_id, true));
            }
        }
    }

    fn release(
        &mut self,
        binding: &ButtonBinding,
        port: &dyn CommandPort,
        surface: &mut dyn Surface,
    ) {
        if !self.pressed.remove(binding.element.id()) {
            return;
        }
        surface.remove_class(&binding.element, binding.kind.pressed_class());
        if !matches!(binding.kind, ButtonKind::MultiPlus | ButtonKind::Pulse) {
            port.send_frame(command::momentary(binding.signal_id, false));
        }
    }

    /// Handle a slider value change.
    ///
    /// The temperature setpoint slider mirrors its value straight into the
    /// target readout; dimmer sliders mirror a percentage into their sibling
    /// display.
    pub fn slider_input(
        &mut self,
        element_id: &str,
        value: i32,
        port: &dyn CommandPort,
        surface: &mut dyn Surface,
    ) {
        let Some(binding) = self.sliders.iter().find(|s| s.element.id() == element_id) else {
            return;
        };
        port.send_frame(command::dimmer(binding.signal_id, value));
        if binding.signal_id == self.setpoint_signal {
            if let Some(readout) = &self.special.target_temp {
                surface.set_text(readout, &format!("{value}°F"));
            }
        } else if let Some(display) = &binding.value_display {
            let percent = value.clamp(0, 1000) / 10;
            surface.set_text(display, &format!("{percent}%"));
        }
    }

    /// Activate one tab within a tab strip.
    pub fn select_tab(&mut self, group: &str, tab: &str, surface: &mut dyn Surface) {
        for binding in &self.tabs {
            if binding.group != group {
                continue;
            }
            let selected = binding.tab == tab;
            surface.set_class(&binding.element, "active", selected);
            if binding.content {
                surface.set_style(&binding.element, "display", if selected { "block" } else { "none" });
            }
        }
    }

    /// Open the current-limit modal, seeded with the current selection.
    pub fn ac_limit_open(&mut self, surface: &mut dyn Surface) {
        if let Some(modal) = &self.special.ac_limit_modal {
            surface.set_style(modal, "display", "flex");
        }
        self.render_ac_limit_selection(surface);
    }

    /// Close the current-limit modal without applying.
    pub fn ac_limit_close(&mut self, surface: &mut dyn Surface) {
        if let Some(modal) = &self.special.ac_limit_modal {
            surface.set_style(modal, "display", "none");
        }
    }

    /// Select a preset current limit inside the modal.
    pub fn ac_limit_preset(&mut self, limit: u8, surface: &mut dyn Surface) {
        self.ac_limit_selection = limit.clamp(AC_LIMIT_MIN, AC_LIMIT_MAX);
        self.render_ac_limit_selection(surface);
    }

    /// Step the selected current limit up or down by one amp.
    pub fn ac_limit_step(&mut self, up: bool, surface: &mut dyn Surface) {
        let next = if up {
            self.ac_limit_selection.saturating_add(1)
        } else {
            self.ac_limit_selection.saturating_sub(1)
        };
        self.ac_limit_selection = next.clamp(AC_LIMIT_MIN, AC_LIMIT_MAX);
        self.render_ac_limit_selection(surface);
    }

    /// Apply the selected limit and close the modal.
    ///
    /// The device also pulses its limit-applied signal, which closes the
    /// modal again through the widget binding; both paths are idempotent.
    pub fn ac_limit_apply(&mut self, port: &dyn CommandPort, surface: &mut dyn Surface) {
        debug!(limit = self.ac_limit_selection, "applying shore current limit");
        port.send_frame(command::ac_limit(self.ac_limit_selection));
        self.ac_limit_close(surface);
    }

    fn render_ac_limit_selection(&self, surface: &mut dyn Surface) {
        if let Some(readout) = &self.special.ac_limit_selection {
            surface.set_text(readout, &self.ac_limit_selection.to_string());
        }
    }
}
