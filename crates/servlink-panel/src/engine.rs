//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Button and indicator state reconciliation.
//!
//! The device reports button state in four frame shapes: `(16,0)`, `(16,1)`,
//! `(16,5)` and `(32,48)`. The engine maps those onto the resolved bindings
//! and keeps radio groups mutually exclusive.
//!
//! The air-conditioning signals 95 through 100 never produce status updates
//! on mode changes, so the engine intercepts the device's own command echo
//! `(17,1)` for that range and synthesizes the status frames the device
//! should have sent: one off-frame per sibling in the group, then the
//! on-frame for the pressed signal. Release echoes are ignored.

use std::collections::HashMap;

use servlink_proto::{channel_cmd, msg_type, Frame};
use tracing::debug;

use crate::layout::{ButtonBinding, ButtonKind, IndicatorBinding, ResolvedLayout};
use crate::surface::Surface;

/// Signals covered by the command-echo workaround.
pub const AC_SIGNAL_RANGE: std::ops::RangeInclusive<u16> = 95..=100;
/// Air-conditioning mode radio group.
pub const AC_MODE_GROUP: [u16; 3] = [95, 98, 99];
/// Fan mode radio group.
pub const FAN_MODE_GROUP: [u16; 3] = [96, 97, 100];

fn ac_group(signal_id: u16) -> &'static [u16; 3] {
    if AC_MODE_GROUP.contains(&signal_id) {
        &AC_MODE_GROUP
    } else {
        &FAN_MODE_GROUP
    }
}

/// Reconciles reported button state onto the surface.
#[derive(Debug)]
pub struct StateEngine {
    buttons: Vec<ButtonBinding>,
    indicators: Vec<IndicatorBinding>,
    /// Latched on/off state for the command-echo range only.
    active: HashMap<u16, bool>,
}

impl StateEngine {
    /// Build the engine over the resolved bindings.
    pub fn new(layout: &ResolvedLayout) -> Self {
        Self {
            buttons: layout.buttons.clone(),
            indicators: layout.indicators.clone(),
            active: HashMap::new(),
        }
    }

    /// Latched state for a signal in the command-echo range.
    pub fn is_active(&self, signal_id: u16) -> bool {
        self.active.get(&signal_id).copied().unwrap_or(false)
    }

    /// Apply one button-state frame to the surface.
    ///
    /// Frames outside the four button-state shapes are ignored, as is the
    /// spurious signal id 0 the device emits in `(32,48)` frames.
    pub fn handle_button_frame(&mut self, frame: &Frame, surface: &mut dyn Surface) {
        let is_button_shape = matches!(
            (frame.message_type, frame.message_cmd),
            (msg_type::MFD_STATUS, channel_cmd::TOGGLE)
                | (msg_type::MFD_STATUS, channel_cmd::MOMENTARY)
                | (msg_type::MFD_STATUS, channel_cmd::STATUS_UPDATE)
                | (msg_type::CHANNEL_INFO, 48)
        );
        if !is_button_shape {
            return;
        }
        let Some(signal_id) = frame.signal_id() else {
            return;
        };
        if frame.message_type == msg_type::CHANNEL_INFO && signal_id == 0 {
            return;
        }
        let Some(state) = frame.state_byte() else {
            return;
        };
        let on = state == 1;
        if AC_SIGNAL_RANGE.contains(&signal_id) {
            self.latch_ac_state(signal_id, on);
        }
        self.update_buttons(signal_id, on, surface);
        self.update_indicators(signal_id, on, surface);
    }

    fn latch_ac_state(&mut self, signal_id: u16, on: bool) {
        self.active.insert(signal_id, on);
        if on {
            for &sibling in ac_group(signal_id) {
                if sibling != signal_id {
                    self.active.insert(sibling, false);
                }
            }
        }
    }

    /// Synthesize the status frames a command echo in the AC range implies.
    ///
    /// Presses yield one off-frame per group sibling followed by the
    /// on-frame for the pressed signal. Release echoes yield nothing; the
    /// device latches these signals and only a sibling press turns one off.
    pub fn command_echo_sims(&self, frame: &Frame) -> Vec<Frame> {
        if frame.message_type != msg_type::MFD_CONTROL
            || frame.message_cmd != channel_cmd::MOMENTARY
        {
            return Vec::new();
        }
        let Some(signal_id) = frame.signal_id() else {
            return Vec::new();
        };
        if !AC_SIGNAL_RANGE.contains(&signal_id) {
            return Vec::new();
        }
        match frame.state_byte() {
            Some(1) => {}
            _ => return Vec::new(),
        }
        debug!(signal = signal_id, "synthesizing status for command echo");
        let mut sims = Vec::new();
        for &sibling in ac_group(signal_id) {
            if sibling != signal_id {
                sims.push(synthetic_status(sibling, false));
            }
        }
        sims.push(synthetic_status(signal_id, true));
        sims
    }

    /// Mirror a channel 1 command echo straight onto its bindings.
    ///
    /// Channel 1 acknowledges commands without a follow-up status update, so
    /// the echo itself is treated as the state change.
    pub fn channel_one_echo(&mut self, frame: &Frame, surface: &mut dyn Surface) {
        if frame.message_type != msg_type::MFD_CONTROL
            || frame.message_cmd != channel_cmd::MOMENTARY
        {
            return;
        }
        if frame.signal_id() != Some(1) {
            return;
        }
        let Some(state) = frame.state_byte() else {
            return;
        };
        let on = state == 1;
        self.update_buttons(1, on, surface);
        self.update_indicators(1, on, surface);
    }

    fn update_buttons(&self, signal_id: u16, on: bool, surface: &mut dyn Surface) {
        for binding in &self.buttons {
            if binding.signal_id != signal_id {
                continue;
            }
            if on {
                self.clear_rivals(binding, surface);
            }
            render_button(surface, binding, on);
        }
    }

    /// Turning a grouped or multiplus button on visually turns its rivals off.
    fn clear_rivals(&self, binding: &ButtonBinding, surface: &mut dyn Surface) {
        if let Some(group) = binding.group.as_deref() {
            for sibling in &self.buttons {
                if sibling.signal_id != binding.signal_id
                    && sibling.group.as_deref() == Some(group)
                {
                    render_button(surface, sibling, false);
                }
            }
        } else if binding.kind == ButtonKind::MultiPlus {
            for sibling in &self.buttons {
                if sibling.signal_id != binding.signal_id && sibling.kind == ButtonKind::MultiPlus {
                    render_button(surface, sibling, false);
                }
            }
        }
    }

    fn update_indicators(&self, signal_id: u16, on: bool, surface: &mut dyn Surface) {
        for indicator in &self.indicators {
            if indicator.signal_id != signal_id {
                continue;
            }
            surface.set_class(&indicator.element, "active", on);
            surface.set_class(&indicator.element, "inactive", !on);
            if indicator.text_mode {
                let text = if on {
                    indicator.active_text.as_deref().unwrap_or("ON")
                } else {
                    indicator.inactive_text.as_deref().unwrap_or("OFF")
                };
                surface.set_text(&indicator.element, text);
            }
        }
    }
}

/// Build a synthetic `(16,5)` status frame for one signal.
pub fn synthetic_status(signal_id: u16, on: bool) -> Frame {
    let state = u8::from(on);
    let mut data = vec![(signal_id & 0xff) as u8, (signal_id >> 8) as u8, state, 0];
    data.extend_from_slice(&i32::from(state).to_le_bytes());
    Frame::new(msg_type::MFD_STATUS, channel_cmd::STATUS_UPDATE, data)
}

fn render_button(surface: &mut dyn Surface, binding: &ButtonBinding, on: bool) {
    if binding.kind == ButtonKind::Pulse {
        return;
    }
    if let Some(class) = binding.kind.active_class() {
        surface.set_class(&binding.element, class, on);
    }
    if let Some(class) = binding.kind.inactive_class() {
        surface.set_class(&binding.element, class, !on);
    }
    if let Some(icon) = &binding.active_icon {
        surface.set_style(icon, "display", if on { "block" } else { "none" });
    }
    if let Some(icon) = &binding.inactive_icon {
        surface.set_style(icon, "display", if on { "none" } else { "block" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutElement, PanelLayout};
    use crate::surface::RecordingSurface;

    fn layout_element(id: &str, classes: &[&str], signal: u16, group: Option<&str>) -> LayoutElement {
        LayoutElement {
            id: id.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            signal: Some(signal),
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

    fn engine(elements: Vec<LayoutElement>) -> StateEngine {
        StateEngine::new(&PanelLayout { elements }.resolve())
    }

    fn status(signal_id: u16, state: u8) -> Frame {
        Frame::new(16, 5, vec![(signal_id & 0xff) as u8, (signal_id >> 8) as u8, state])
    }

    fn echo(signal_id: u16, state: u8) -> Frame {
        Frame::new(17, 1, vec![(signal_id & 0xff) as u8, (signal_id >> 8) as u8, state])
    }

    #[test]
    fn toggle_button_follows_reported_state() {
        let mut engine = engine(vec![layout_element("btn-pump", &["toggle-btn"], 10, None)]);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(10, 1), &mut surface);
        assert!(surface.has_class("btn-pump", "active"));
        engine.handle_button_frame(&status(10, 0), &mut surface);
        assert!(!surface.has_class("btn-pump", "active"));
    }

    #[test]
    fn grouped_buttons_are_mutually_exclusive_on_the_surface() {
        let mut engine = engine(vec![
            layout_element("ac-cool", &["btn-pill--small"], 95, Some("ac-mode")),
            layout_element("ac-heat", &["btn-pill--small"], 98, Some("ac-mode")),
            layout_element("ac-auto", &["btn-pill--small"], 99, Some("ac-mode")),
        ]);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(95, 1), &mut surface);
        assert!(surface.has_class("ac-cool", "btn-pill--small--active"));
        engine.handle_button_frame(&status(98, 1), &mut surface);
        assert!(surface.has_class("ac-heat", "btn-pill--small--active"));
        assert!(surface.has_class("ac-cool", "btn-pill--small--inactive"));
        assert!(!surface.has_class("ac-cool", "btn-pill--small--active"));
    }

    #[test]
    fn multiplus_buttons_are_exclusive_without_a_group() {
        let mut engine = engine(vec![
            layout_element("mp-on", &["multiplus-btn"], 70, None),
            layout_element("mp-charger", &["multiplus-btn"], 71, None),
        ]);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(70, 1), &mut surface);
        engine.handle_button_frame(&status(71, 1), &mut surface);
        assert!(surface.has_class("mp-charger", "active"));
        assert!(!surface.has_class("mp-on", "active"));
    }

    #[test]
    fn round_buttons_swap_their_icons() {
        let mut elements = vec![layout_element("btn-light", &["btn-round"], 22, None)];
        elements[0].active_icon = Some("icon-light-on".to_string());
        elements[0].inactive_icon = Some("icon-light-off".to_string());
        let mut engine = engine(elements);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(22, 1), &mut surface);
        assert!(surface.has_class("btn-light", "btn-round--active"));
        assert_eq!(surface.style("icon-light-on", "display"), Some("block"));
        assert_eq!(surface.style("icon-light-off", "display"), Some("none"));
    }

    #[test]
    fn text_indicators_render_custom_labels() {
        let mut elements = vec![layout_element(
            "ind-gen",
            &["status-indicator", "status-indicator--text"],
            44,
            None,
        )];
        elements[0].active_text = Some("RUNNING".to_string());
        let mut engine = engine(elements);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(44, 1), &mut surface);
        assert!(surface.has_class("ind-gen", "active"));
        assert_eq!(surface.text("ind-gen"), Some("RUNNING"));
        engine.handle_button_frame(&status(44, 0), &mut surface);
        assert_eq!(surface.text("ind-gen"), Some("OFF"));
    }

    #[test]
    fn channel_info_state_with_signal_zero_is_skipped() {
        let mut engine = engine(vec![layout_element("btn-zero", &["toggle-btn"], 0, None)]);
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&Frame::new(32, 48, vec![0, 0, 1]), &mut surface);
        assert!(surface.element("btn-zero").is_none());
    }

    #[test]
    fn press_echo_synthesizes_sibling_offs_then_the_press() {
        let engine = engine(Vec::new());
        let sims = engine.command_echo_sims(&echo(95, 1));
        assert_eq!(sims.len(), 3);
        assert_eq!(sims[0].signal_id(), Some(98));
        assert_eq!(sims[0].state_byte(), Some(0));
        assert_eq!(sims[1].signal_id(), Some(99));
        assert_eq!(sims[1].state_byte(), Some(0));
        assert_eq!(sims[2].signal_id(), Some(95));
        assert_eq!(sims[2].state_byte(), Some(1));
        for sim in &sims {
            assert_eq!(sim.message_type, 16);
            assert_eq!(sim.message_cmd, 5);
        }
    }

    #[test]
    fn release_echoes_and_out_of_range_echoes_synthesize_nothing() {
        let engine = engine(Vec::new());
        assert!(engine.command_echo_sims(&echo(95, 0)).is_empty());
        assert!(engine.command_echo_sims(&echo(94, 1)).is_empty());
        assert!(engine.command_echo_sims(&echo(101, 1)).is_empty());
        // Wrong shape entirely.
        assert!(engine.command_echo_sims(&status(95, 1)).is_empty());
    }

    #[test]
    fn fan_group_echo_targets_fan_siblings_only() {
        let engine = engine(Vec::new());
        let sims = engine.command_echo_sims(&echo(96, 1));
        let ids: Vec<_> = sims.iter().filter_map(Frame::signal_id).collect();
        assert_eq!(ids, [97, 100, 96]);
    }

    #[test]
    fn latched_state_keeps_at_most_one_group_member_active() {
        let mut engine = engine(Vec::new());
        let mut surface = RecordingSurface::new();
        engine.handle_button_frame(&status(95, 1), &mut surface);
        engine.handle_button_frame(&status(98, 1), &mut surface);
        assert!(engine.is_active(98));
        assert!(!engine.is_active(95));
        assert!(!engine.is_active(99));
        // Fan group is untouched by AC mode changes.
        engine.handle_button_frame(&status(96, 1), &mut surface);
        assert!(engine.is_active(96));
        assert!(engine.is_active(98));
    }

    #[test]
    fn channel_one_echo_updates_its_bindings_directly() {
        let mut engine = engine(vec![layout_element("btn-master", &["toggle-btn"], 1, None)]);
        let mut surface = RecordingSurface::new();
        engine.channel_one_echo(&echo(1, 1), &mut surface);
        assert!(surface.has_class("btn-master", "active"));
        engine.channel_one_echo(&echo(1, 0), &mut surface);
        assert!(!surface.has_class("btn-master", "active"));
        // Other channels do not take the shortcut.
        engine.channel_one_echo(&echo(2, 1), &mut surface);
        assert!(surface.element("btn-2").is_none());
    }
}
