//! ---
//! sl_section: "02-signal-model"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Signal metadata, conversion, decoding and formatting."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Domain model for panel signals.
//!
//! A signal is one monitored or controllable quantity on the control bus,
//! identified by a `u16` id. This crate loads the external signal metadata
//! file, converts raw wire values into engineering units, decodes classified
//! frames into [`DomainSignal`] objects and renders display strings.

#![warn(missing_docs)]

pub mod convert;
pub mod decode;
pub mod format;
pub mod metadata;

pub use convert::{convert_raw, TemperatureUnit};
pub use decode::{DomainSignal, SignalDecoder, SignalKind};
pub use format::FormatterRegistry;
pub use metadata::{SignalCatalog, SignalRecord};

/// Shared result type for signal model operations.
pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors raised while loading or interpreting signal metadata.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The metadata file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The metadata file is not valid JSON of the expected shape.
    #[error("metadata parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
