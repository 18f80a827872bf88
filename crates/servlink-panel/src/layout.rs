//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Panel layout description and binding resolution.
//!
//! The layout file lists every element on the surface together with its
//! class list and the signal it is wired to. Resolution walks the list once
//! at startup and classifies each element into a typed binding, so no class
//! string is ever inspected again on the hot dispatch path.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::surface::ElementRef;
use crate::PanelError;

/// Visual style of a controllable button, resolved once from its classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Plain latching toggle.
    Toggle,
    /// Inverter/charger mode button; one active per panel.
    MultiPlus,
    /// Small pill button.
    PillSmall,
    /// Medium pill button.
    PillMedium,
    /// Long pill button.
    PillLong,
    /// Round button with swappable icons.
    Round,
    /// Momentary button with no latched server state.
    Pulse,
}

impl ButtonKind {
    fn from_classes(classes: &[String]) -> Option<Self> {
        classes.iter().find_map(|class| match class.as_str() {
            "toggle-btn" => Some(Self::Toggle),
            "multiplus-btn" => Some(Self::MultiPlus),
            "btn-pill--small" => Some(Self::PillSmall),
            "btn-pill--medium" => Some(Self::PillMedium),
            "btn-pill--long" => Some(Self::PillLong),
            "btn-round" | "round-btn" => Some(Self::Round),
            "pulse-btn" => Some(Self::Pulse),
            _ => None,
        })
    }

    /// Class added when the device reports the button on.
    pub fn active_class(self) -> Option<&'static str> {
        match self {
            Self::Toggle | Self::MultiPlus => Some("active"),
            Self::PillSmall => Some("btn-pill--small--active"),
            Self::PillMedium => Some("btn-pill--medium--active"),
            Self::PillLong => Some("btn-pill--long--active"),
            Self::Round => Some("btn-round--active"),
            Self::Pulse => None,
        }
    }

    /// Class added when the device reports the button off.
    pub fn inactive_class(self) -> Option<&'static str> {
        match self {
            Self::Toggle | Self::MultiPlus | Self::Pulse => None,
            Self::PillSmall => Some("btn-pill--small--inactive"),
            Self::PillMedium => Some("btn-pill--medium--inactive"),
            Self::PillLong => Some("btn-pill--long--inactive"),
            Self::Round => Some("btn-round--inactive"),
        }
    }

    /// Class applied for the duration of a pointer press.
    pub fn pressed_class(self) -> &'static str {
        match self {
            Self::Toggle | Self::MultiPlus => "pressed",
            Self::PillSmall => "btn-pill--small--pressed",
            Self::PillMedium => "btn-pill--medium--pressed",
            Self::PillLong => "btn-pill--long--pressed",
            Self::Round => "btn-round--pressed",
            Self::Pulse => "active",
        }
    }
}

/// One element as declared in the layout file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutElement {
    /// Element identifier on the surface.
    pub id: String,
    /// Class list, drives binding resolution.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Signal the element is wired to.
    #[serde(default)]
    pub signal: Option<u16>,
    /// Radio group name for mutually exclusive buttons.
    #[serde(default)]
    pub group: Option<String>,
    /// Indicator text when the signal is on.
    #[serde(default)]
    pub active_text: Option<String>,
    /// Indicator text when the signal is off.
    #[serde(default)]
    pub inactive_text: Option<String>,
    /// Icon element shown while a round button is active.
    #[serde(default)]
    pub active_icon: Option<String>,
    /// Icon element shown while a round button is inactive.
    #[serde(default)]
    pub inactive_icon: Option<String>,
    /// Sibling element mirroring a slider's current value.
    #[serde(default)]
    pub value_display: Option<String>,
    /// Tab identifier for tab buttons and tab content panes.
    #[serde(default)]
    pub tab: Option<String>,
    /// Tab strip this tab element belongs to.
    #[serde(default)]
    pub tab_group: Option<String>,
}

/// Declarative description of the whole panel surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelLayout {
    /// All declared elements.
    #[serde(default)]
    pub elements: Vec<LayoutElement>,
}

/// A controllable button, wired to one signal.
#[derive(Debug, Clone)]
pub struct ButtonBinding {
    /// Target element.
    pub element: ElementRef,
    /// Signal driving the button.
    pub signal_id: u16,
    /// Resolved visual style.
    pub kind: ButtonKind,
    /// Radio group, if the button is mutually exclusive with others.
    pub group: Option<String>,
    /// Icon swapped in while active (round buttons).
    pub active_icon: Option<ElementRef>,
    /// Icon swapped in while inactive (round buttons).
    pub inactive_icon: Option<ElementRef>,
}

/// A read-only status indicator.
#[derive(Debug, Clone)]
pub struct IndicatorBinding {
    /// Target element.
    pub element: ElementRef,
    /// Signal driving the indicator.
    pub signal_id: u16,
    /// Whether the indicator also renders on/off text.
    pub text_mode: bool,
    /// Text when on; defaults to `ON`.
    pub active_text: Option<String>,
    /// Text when off; defaults to `OFF`.
    pub inactive_text: Option<String>,
}

/// A formatted value display.
#[derive(Debug, Clone)]
pub struct ValueBinding {
    /// Target element.
    pub element: ElementRef,
    /// Signal whose formatted value is shown.
    pub signal_id: u16,
}

/// A dimmer or setpoint slider.
#[derive(Debug, Clone)]
pub struct SliderBinding {
    /// The input element.
    pub element: ElementRef,
    /// Signal the slider commands.
    pub signal_id: u16,
    /// Sibling element mirroring the slider value, if any.
    pub value_display: Option<ElementRef>,
}

/// A vertical tank gauge fill element.
#[derive(Debug, Clone)]
pub struct GaugeBinding {
    /// The fill element whose height tracks the level.
    pub element: ElementRef,
    /// Level signal in percent.
    pub signal_id: u16,
}

/// One tab button or tab content pane.
#[derive(Debug, Clone)]
pub struct TabBinding {
    /// Target element.
    pub element: ElementRef,
    /// Tab strip this element belongs to.
    pub group: String,
    /// Tab identifier within the strip.
    pub tab: String,
    /// True for content panes, false for tab buttons.
    pub content: bool,
}

/// Typed bindings produced from a [`PanelLayout`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedLayout {
    /// Controllable buttons.
    pub buttons: Vec<ButtonBinding>,
    /// Read-only indicators.
    pub indicators: Vec<IndicatorBinding>,
    /// Formatted value displays.
    pub values: Vec<ValueBinding>,
    /// Dimmer and setpoint sliders.
    pub sliders: Vec<SliderBinding>,
    /// Tank gauge fills.
    pub gauges: Vec<GaugeBinding>,
    /// Tab buttons and panes.
    pub tabs: Vec<TabBinding>,
}

impl PanelLayout {
    /// Load a layout from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PanelError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Classify every element into its typed binding.
    ///
    /// Elements that declare a button class without a signal are skipped
    /// with a warning; nothing could ever drive them.
    pub fn resolve(&self) -> ResolvedLayout {
        let mut resolved = ResolvedLayout::default();
        for element in &self.elements {
            let target = ElementRef::new(&element.id);
            let has = |class: &str| element.classes.iter().any(|c| c == class);

            if let Some(kind) = ButtonKind::from_classes(&element.classes) {
                let Some(signal_id) = element.signal else {
                    warn!(element = %element.id, "button element without a signal, skipping");
                    continue;
                };
                resolved.buttons.push(ButtonBinding {
                    element: target,
                    signal_id,
                    kind,
                    group: element.group.clone(),
                    active_icon: element.active_icon.as_deref().map(ElementRef::new),
                    inactive_icon: element.inactive_icon.as_deref().map(ElementRef::new),
                });
            } else if has("status-indicator") {
                let Some(signal_id) = element.signal else {
                    warn!(element = %element.id, "indicator element without a signal, skipping");
                    continue;
                };
                resolved.indicators.push(IndicatorBinding {
                    element: target,
                    signal_id,
                    text_mode: has("status-indicator--text"),
                    active_text: element.active_text.clone(),
                    inactive_text: element.inactive_text.clone(),
                });
            } else if has("signal-value") {
                if let Some(signal_id) = element.signal {
                    resolved.values.push(ValueBinding { element: target, signal_id });
                }
            } else if has("slider") {
                if let Some(signal_id) = element.signal {
                    resolved.sliders.push(SliderBinding {
                        element: target,
                        signal_id,
                        value_display: element.value_display.as_deref().map(ElementRef::new),
                    });
                }
            } else if has("gauge-level") {
                if let Some(signal_id) = element.signal {
                    resolved.gauges.push(GaugeBinding { element: target, signal_id });
                }
            } else if has("tab-btn") || has("tab-content") {
                if let (Some(tab), Some(group)) = (element.tab.clone(), element.tab_group.clone()) {
                    resolved.tabs.push(TabBinding {
                        element: target,
                        group,
                        tab,
                        content: has("tab-content"),
                    });
                }
            }
        }
        resolved
    }
}
