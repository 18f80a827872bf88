//! ---
//! sl_section: "03-transport"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Supervised WebSocket link to the panel device."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! The transport owns exactly one logical connection to the control device
//! and supervises its liveness: a client heartbeat every five seconds, a
//! watchdog that forces an immediate reconnect once the inbound stream has
//! been quiet for ten seconds, and a delayed subscription handshake on every
//! (re)connect. Inbound frames fan out to subscribers over a broadcast
//! channel; dropping the receiver is the unsubscribe.

#![warn(missing_docs)]

mod link;

pub use link::{Link, LinkConfig, LinkState, FALLBACK_HOST};
