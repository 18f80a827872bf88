//! ---
//! sl_section: "01-protocol"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Wire frame model and command builders."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Wire protocol for the panel control bus.
//!
//! Every message on the WebSocket is a single JSON text object carrying a
//! binary frame: a `(messagetype, messagecmd)` pair, a declared size and a
//! little-endian packed byte payload. This crate owns the frame model, the
//! classification of inbound frames into recognised shapes, and the builders
//! for every command frame the client sends.

#![warn(missing_docs)]

pub mod command;
pub mod frame;

pub use frame::{classify, Frame, FrameKind};

/// Message type identifiers carried in `messagetype`.
pub mod msg_type {
    /// MFD channel status updates.
    pub const MFD_STATUS: u8 = 16;
    /// MFD control commands (client to device; echoed back by the device).
    pub const MFD_CONTROL: u8 = 17;
    /// Channel information responses.
    pub const CHANNEL_INFO: u8 = 32;
    /// System commands, including the WDU heartbeat.
    pub const SYSTEM_CMD: u8 = 48;
    /// System information requests.
    pub const SYSTEM_REQ: u8 = 49;
    /// NMEA marine-data messages.
    pub const NMEA: u8 = 0x52;
    /// Bus subscription requests.
    pub const SUBSCRIPTION_REQUEST: u8 = 0x60;
    /// Acknowledgement frames.
    pub const ACKNOWLEDGEMENT: u8 = 128;
}

/// Command identifiers used with [`msg_type::MFD_CONTROL`].
pub mod channel_cmd {
    /// Latching toggle (compatibility path).
    pub const TOGGLE: u8 = 0;
    /// Momentary press/release.
    pub const MOMENTARY: u8 = 1;
    /// Dimmer level update.
    pub const DIMMER_UPDATE: u8 = 3;
    /// Forced on/off setpoint.
    pub const SETPOINT: u8 = 4;
    /// Status update (device to client).
    pub const STATUS_UPDATE: u8 = 5;
}

/// Command identifiers used with [`msg_type::SYSTEM_CMD`] / [`msg_type::SYSTEM_REQ`].
pub mod system_cmd {
    /// WDU information request.
    pub const WDU_INFO: u8 = 1;
    /// WDU heartbeat (both directions).
    pub const WDU_HEARTBEAT: u8 = 5;
}

/// Command identifiers used with [`msg_type::ACKNOWLEDGEMENT`].
pub mod ack_cmd {
    /// Plain acknowledgement.
    pub const ACK: u8 = 0;
}
