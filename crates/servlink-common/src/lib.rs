//! ---
//! sl_section: "05-runtime"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Shared configuration handling and logging setup."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Shared runtime plumbing: configuration loading and tracing setup.

pub mod config;
pub mod logging;

pub use config::{AppConfig, LayoutConfig, LinkSettings, LoadedAppConfig, LoggingConfig, MetadataConfig};
pub use logging::{init_tracing, LogFormat};
