//! ---
//! sl_section: "02-signal-model"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Signal metadata, conversion, decoding and formatting."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Raw-value unit conversion.
//!
//! The mapping from `dataItemFormatType` codes to units is a fixed table
//! reproduced from observed device behaviour: 6 amperage, 14 generic
//! decimal, 22 temperature, 23/24 time scales, 27 voltage. Unknown codes
//! pass the raw value through unchanged.

/// Format codes with a known conversion.
pub mod format_type {
    /// Milliamps to amps.
    pub const AMPERAGE: u8 = 6;
    /// Thousandths to a generic decimal / percentage.
    pub const DECIMAL: u8 = 14;
    /// Millikelvin to display temperature.
    pub const TEMPERATURE: u8 = 22;
    /// Remaining-time scale (to seconds).
    pub const TIME_REMAINING: u8 = 23;
    /// Clock-time scale (milliseconds to seconds).
    pub const TIME_CLOCK: u8 = 24;
    /// Millivolts to volts.
    pub const VOLTAGE: u8 = 27;
}

/// Convert a raw wire value into engineering units for its format code.
pub fn convert_raw(format: u8, raw: i32) -> f64 {
    let raw = f64::from(raw);
    match format {
        format_type::AMPERAGE | format_type::DECIMAL | format_type::VOLTAGE => raw / 1000.0,
        format_type::TEMPERATURE => raw_kelvin_to_fahrenheit(raw),
        format_type::TIME_REMAINING => raw * 3.6,
        format_type::TIME_CLOCK => raw / 1000.0,
        _ => raw,
    }
}

fn raw_kelvin_to_fahrenheit(raw: f64) -> f64 {
    (raw / 1000.0) * 1.8 - 459.67
}

/// Temperature display units. The panel defaults to Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    /// Degrees Fahrenheit.
    #[default]
    Fahrenheit,
    /// Degrees Celsius.
    Celsius,
    /// Kelvin.
    Kelvin,
}

impl TemperatureUnit {
    /// Convert a raw millikelvin value into this unit.
    pub fn convert(self, raw: i32) -> f64 {
        let raw = f64::from(raw);
        match self {
            Self::Fahrenheit => raw_kelvin_to_fahrenheit(raw),
            Self::Celsius => raw / 1000.0 - 273.15,
            Self::Kelvin => raw / 1000.0,
        }
    }

    /// Unit label suffix for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fahrenheit => "°F",
            Self::Celsius => "°C",
            Self::Kelvin => "K",
        }
    }

    /// Render a converted value as a rounded display string.
    pub fn format(self, value: f64) -> String {
        format!("{}{}", value.round(), self.label())
    }
}
