//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Display widgets: formatted values, tank gauges and the handful of
//! special-cased elements the panel wires to fixed signal ids.

use std::sync::Arc;

use servlink_signal::{FormatterRegistry, TemperatureUnit};
use servlink_transport::LinkState;

use crate::dispatch::{Dispatcher, SignalClass};
use crate::layout::{GaugeBinding, ValueBinding};
use crate::surface::{ElementRef, Surface};

/// Signal ids with hard-wired panel behaviour.
pub mod well_known {
    /// Generator charging indicator; glows while the value is 1.
    pub const GENERATOR_CHARGE: u16 = 44;
    /// Interior temperature, reported in millikelvin.
    pub const INTERIOR_TEMP: u16 = 34;
    /// HVAC target temperature setpoint.
    pub const TARGET_TEMP: u16 = 59;
    /// Slider-commanded temperature setpoint channel.
    pub const TEMP_SETPOINT: u16 = 57;
    /// Currently applied shore-power current limit.
    pub const CURRENT_AC_LIMIT: u16 = 35;
    /// Pulsed by the device once a new current limit has been applied.
    pub const AC_LIMIT_APPLIED: u16 = 45;
}

/// Elements with fixed-signal behaviour; any of them may be absent from a
/// given layout.
#[derive(Debug, Clone, Default)]
pub struct SpecialElements {
    /// Generator charge icon, signal 44.
    pub generator_icon: Option<ElementRef>,
    /// Interior temperature readout, signal 34.
    pub interior_temp: Option<ElementRef>,
    /// Target temperature readout, signal 59.
    pub target_temp: Option<ElementRef>,
    /// Target temperature slider, follows signal 59.
    pub target_temp_slider: Option<ElementRef>,
    /// Applied current-limit readout, signal 35.
    pub ac_limit_value: Option<ElementRef>,
    /// Current-limit modal, closed when signal 45 pulses.
    pub ac_limit_modal: Option<ElementRef>,
    /// Selection readout inside the current-limit modal.
    pub ac_limit_selection: Option<ElementRef>,
    /// Connection state text element.
    pub connection_status: Option<ElementRef>,
    /// Connect button, disabled while connected.
    pub connect_btn: Option<ElementRef>,
    /// Disconnect button, disabled while disconnected.
    pub disconnect_btn: Option<ElementRef>,
}

/// Wire every formatted value display to its signal.
///
/// Each update writes the formatted value and keeps an `unavailable` class
/// in step with the device's availability flag.
pub fn bind_value_displays(
    dispatcher: &mut Dispatcher,
    values: &[ValueBinding],
    formatters: Arc<FormatterRegistry>,
) {
    for binding in values {
        let element = binding.element.clone();
        let formatters = Arc::clone(&formatters);
        dispatcher.subscribe(
            binding.signal_id,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                surface.set_text(&element, &formatters.display(signal.signal_id, signal.value));
                surface.set_class(&element, "unavailable", signal.unavailable);
                Ok(())
            }),
        );
    }
}

/// Wire tank gauge fills to their level signals.
pub fn bind_gauges(dispatcher: &mut Dispatcher, gauges: &[GaugeBinding]) {
    for binding in gauges {
        let element = binding.element.clone();
        dispatcher.subscribe(
            binding.signal_id,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                let percent = signal.value.clamp(0.0, 100.0);
                surface.set_style(&element, "height", &format!("{}%", percent.round()));
                Ok(())
            }),
        );
    }
}

/// Wire the fixed-signal special elements.
pub fn bind_special(dispatcher: &mut Dispatcher, special: &SpecialElements) {
    if let Some(icon) = special.generator_icon.clone() {
        dispatcher.subscribe(
            well_known::GENERATOR_CHARGE,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                surface.set_class(&icon, "glowing", signal.value > 0.0);
                Ok(())
            }),
        );
    }
    if let Some(readout) = special.interior_temp.clone() {
        dispatcher.subscribe(
            well_known::INTERIOR_TEMP,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                let degrees = TemperatureUnit::Fahrenheit.convert(signal.raw_value);
                surface.set_text(&readout, &format!("{degrees:.1}°F"));
                Ok(())
            }),
        );
    }
    if special.target_temp.is_some() || special.target_temp_slider.is_some() {
        let readout = special.target_temp.clone();
        let slider = special.target_temp_slider.clone();
        dispatcher.subscribe(
            well_known::TARGET_TEMP,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                let degrees = signal.value.round();
                if let Some(readout) = &readout {
                    surface.set_text(readout, &format!("{degrees}°F"));
                }
                if let Some(slider) = &slider {
                    surface.set_input_value(slider, &degrees.to_string());
                }
                Ok(())
            }),
        );
    }
    if let Some(readout) = special.ac_limit_value.clone() {
        dispatcher.subscribe(
            well_known::CURRENT_AC_LIMIT,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                surface.set_text(&readout, &signal.value.round().to_string());
                Ok(())
            }),
        );
    }
    if let Some(modal) = special.ac_limit_modal.clone() {
        dispatcher.subscribe(
            well_known::AC_LIMIT_APPLIED,
            SignalClass::Mfd,
            Box::new(move |signal, surface| {
                if signal.raw_value == 1 {
                    surface.set_style(&modal, "display", "none");
                }
                Ok(())
            }),
        );
    }
}

/// Reflect the link state onto the connection widgets.
pub fn apply_link_state(surface: &mut dyn Surface, special: &SpecialElements, state: LinkState) {
    let name = match state {
        LinkState::Closed => "closed",
        LinkState::Connecting => "connecting",
        LinkState::Open => "open",
        LinkState::Error => "error",
    };
    if let Some(status) = &special.connection_status {
        for other in ["closed", "connecting", "open", "error"] {
            surface.set_class(status, other, other == name);
        }
        let mut label = name.to_string();
        label[..1].make_ascii_uppercase();
        surface.set_text(status, &label);
    }
    let connected = matches!(state, LinkState::Open | LinkState::Connecting);
    if let Some(connect) = &special.connect_btn {
        surface.set_class(connect, "disabled", connected);
    }
    if let Some(disconnect) = &special.disconnect_btn {
        surface.set_class(disconnect, "disabled", !connected);
    }
}
