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
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;

/// Channel type marking a signal as a monitored value.
pub const CHANNEL_TYPE_MONITORED: u8 = 5;

/// One record of the external `signal-info.json` metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    /// Signal identifier on the control bus.
    pub signal_id: u16,
    /// Raw data type reported by the device.
    #[serde(default)]
    pub data_type: u8,
    /// Human-readable channel description.
    #[serde(default)]
    pub description: String,
    /// Channel classification; 5 marks a monitored value.
    #[serde(default)]
    pub channel_type: u8,
    /// Format code driving unit conversion and display rendering.
    #[serde(default)]
    pub data_item_format_type: u8,
    /// Channel setting classification.
    #[serde(default)]
    pub channel_setting_type: u8,
}

/// Immutable signal metadata map, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SignalCatalog {
    records: HashMap<u16, SignalRecord>,
}

impl SignalCatalog {
    /// Build a catalog from in-memory records.
    pub fn from_records(records: impl IntoIterator<Item = SignalRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.signal_id, record))
                .collect(),
        }
    }

    /// Load the catalog from a JSON array file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let records: Vec<SignalRecord> = serde_json::from_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            signals = records.len(),
            "signal metadata loaded"
        );
        Ok(Self::from_records(records))
    }

    /// Load the catalog, degrading to an empty map when the file is missing
    /// or malformed. Every consumer falls back to identity conversion and
    /// default formatting in that case.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_path(path.as_ref()) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    path = %path.as_ref().display(),
                    error = %err,
                    "signal metadata unavailable; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Look up the record for a signal id.
    pub fn get(&self, signal_id: u16) -> Option<&SignalRecord> {
        self.records.get(&signal_id)
    }

    /// Format code for a signal, defaulting to 0 (identity) when unknown.
    pub fn format_type(&self, signal_id: u16) -> u8 {
        self.get(signal_id)
            .map(|record| record.data_item_format_type)
            .unwrap_or(0)
    }

    /// Whether the signal is flagged as a monitored channel.
    pub fn is_monitored(&self, signal_id: u16) -> bool {
        self.get(signal_id)
            .map(|record| record.channel_type == CHANNEL_TYPE_MONITORED)
            .unwrap_or(false)
    }

    /// Iterate over all known records.
    pub fn records(&self) -> impl Iterator<Item = &SignalRecord> {
        self.records.values()
    }

    /// Number of known signals.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
