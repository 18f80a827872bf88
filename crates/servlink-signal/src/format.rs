//! ---
//! sl_section: "02-signal-model"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Signal metadata, conversion, decoding and formatting."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use std::collections::HashMap;

use crate::convert::format_type;
use crate::metadata::SignalCatalog;

/// Hours at or beyond which a remaining-time value renders as infinite.
const REMAINING_TIME_INFINITY_HOURS: f64 = 19.0;

#[derive(Debug, Clone, PartialEq)]
enum Formatter {
    Amperage,
    Percentage,
    Temperature,
    RemainingTime,
    ClockTime,
    /// Format 27 renders as voltage only when the channel description says so.
    Voltage { is_voltage: bool },
    Default,
}

impl Formatter {
    fn render(&self, value: f64) -> String {
        match self {
            Self::Amperage => format!("{value:.1}A"),
            Self::Percentage => format!("{}%", value.round()),
            Self::Temperature => format!("{}°F", value.round()),
            Self::RemainingTime => render_remaining_time(value),
            Self::ClockTime => render_clock_time(value),
            Self::Voltage { is_voltage: true } => format!("{value:.1}V"),
            Self::Voltage { is_voltage: false } | Self::Default => value.to_string(),
        }
    }
}

fn render_remaining_time(seconds: f64) -> String {
    let total_hours = seconds / 3600.0;
    if total_hours >= REMAINING_TIME_INFINITY_HOURS {
        return "∞".to_string();
    }
    let days = (total_hours / 24.0).floor() as i64;
    let hours = (total_hours % 24.0).floor() as i64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as i64;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}:{minutes:02}")
    } else {
        format!("{minutes}m")
    }
}

fn render_clock_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as i64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as i64;
    format!("{hours:02}:{minutes:02}")
}

/// Display formatting per signal id, built once from the metadata catalog.
///
/// Only monitored channels (channel type 5) receive typed formatters; every
/// other id renders through the default formatter. Lookups never fail.
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<u16, Formatter>,
}

impl FormatterRegistry {
    /// Build the registry from the loaded catalog.
    pub fn new(catalog: &SignalCatalog) -> Self {
        let mut formatters = HashMap::new();
        for record in catalog.records() {
            if !catalog.is_monitored(record.signal_id) {
                continue;
            }
            let formatter = match record.data_item_format_type {
                format_type::AMPERAGE => Formatter::Amperage,
                format_type::DECIMAL => Formatter::Percentage,
                format_type::TEMPERATURE => Formatter::Temperature,
                format_type::TIME_REMAINING => Formatter::RemainingTime,
                format_type::TIME_CLOCK => Formatter::ClockTime,
                format_type::VOLTAGE => Formatter::Voltage {
                    is_voltage: record.description.contains("voltage"),
                },
                _ => Formatter::Default,
            };
            formatters.insert(record.signal_id, formatter);
        }
        Self { formatters }
    }

    /// Render the display string for a signal's converted value.
    pub fn display(&self, signal_id: u16, value: f64) -> String {
        self.formatters
            .get(&signal_id)
            .unwrap_or(&Formatter::Default)
            .render(value)
    }
}
