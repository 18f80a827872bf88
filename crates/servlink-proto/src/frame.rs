//! ---
//! sl_section: "01-protocol"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Wire frame model and command builders."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::{msg_type, system_cmd};

/// One wire-level message unit.
///
/// The device tolerates `data.len() != size`; decoders only require the
/// minimum byte count for their shape, so `size` is carried as declared but
/// never validated against the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Message type discriminator.
    #[serde(rename = "messagetype")]
    pub message_type: u8,
    /// Command discriminator within the message type.
    #[serde(rename = "messagecmd")]
    pub message_cmd: u8,
    /// Declared payload size in bytes.
    #[serde(default)]
    pub size: u8,
    /// Little-endian packed payload bytes.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Frame {
    /// Construct a frame, deriving `size` from the payload length.
    pub fn new(message_type: u8, message_cmd: u8, data: Vec<u8>) -> Self {
        Self {
            message_type,
            message_cmd,
            size: data.len() as u8,
            data,
        }
    }

    /// Parse a frame from its JSON wire representation.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialise the frame to its JSON wire representation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Signal id from the first two payload bytes, when present.
    pub fn signal_id(&self) -> Option<u16> {
        let lo = *self.data.first()?;
        let hi = *self.data.get(1)?;
        Some(u16::from(lo) | (u16::from(hi) << 8))
    }

    /// State byte (payload byte 2), when present.
    pub fn state_byte(&self) -> Option<u8> {
        self.data.get(2).copied()
    }

    /// Little-endian signed 32-bit value at `offset`, when enough bytes exist.
    pub fn raw_i32(&self, offset: usize) -> Option<i32> {
        let bytes = self.data.get(offset..offset + 4)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Recognised frame shapes, keyed on `(messagetype, messagecmd)`.
///
/// Unknown combinations land in [`FrameKind::Unrecognized`] so the dispatcher
/// can drop them in one explicit place instead of scattered default branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// MFD channel status family (`messagetype` 16).
    MfdStatus,
    /// Control command echo (`messagetype` 17) with its channel command.
    ControlEcho {
        /// Channel command carried by the echo.
        cmd: u8,
    },
    /// Channel information family (`messagetype` 32).
    ChannelInfo,
    /// NMEA marine-data message (`messagetype` 0x52).
    Nmea,
    /// Device heartbeat request (`48, 5`), answered by the transport.
    HeartbeatRequest,
    /// Acknowledgement frame (`messagetype` 128).
    Acknowledgement,
    /// Any other `(messagetype, messagecmd)` combination.
    Unrecognized {
        /// Raw message type of the unrecognised frame.
        message_type: u8,
        /// Raw message command of the unrecognised frame.
        message_cmd: u8,
    },
}

/// Classify a frame by its `(messagetype, messagecmd)` pair.
pub fn classify(frame: &Frame) -> FrameKind {
    match (frame.message_type, frame.message_cmd) {
        (msg_type::SYSTEM_CMD, system_cmd::WDU_HEARTBEAT) => FrameKind::HeartbeatRequest,
        (msg_type::MFD_STATUS, _) => FrameKind::MfdStatus,
        (msg_type::MFD_CONTROL, cmd) => FrameKind::ControlEcho { cmd },
        (msg_type::CHANNEL_INFO, _) => FrameKind::ChannelInfo,
        (msg_type::NMEA, _) => FrameKind::Nmea,
        (msg_type::ACKNOWLEDGEMENT, _) => FrameKind::Acknowledgement,
        (message_type, message_cmd) => FrameKind::Unrecognized {
            message_type,
            message_cmd,
        },
    }
}
