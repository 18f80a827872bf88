//! ---
//! sl_section: "01-protocol"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Wire frame model and command builders."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Builders for every command frame the client sends.
//!
//! All buttons on the panel are wired as momentary press/release pairs; any
//! latching behaviour lives in the device firmware, so no builder here models
//! a client-side latch.

use crate::frame::Frame;
use crate::{ack_cmd, channel_cmd, msg_type, system_cmd};

/// The two bus classes a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusClass {
    /// Main control bus.
    Mfd,
    /// NMEA marine-data bus.
    Nmea,
}

/// Client heartbeat sent every heartbeat interval while the link is open.
pub fn heartbeat() -> Frame {
    Frame::new(msg_type::SYSTEM_CMD, system_cmd::WDU_HEARTBEAT, Vec::new())
}

/// Acknowledgement for a received device heartbeat request.
pub fn heartbeat_ack() -> Frame {
    Frame::new(msg_type::ACKNOWLEDGEMENT, ack_cmd::ACK, vec![0])
}

/// Request for WDU device information.
pub fn request_device_info() -> Frame {
    Frame::new(msg_type::SYSTEM_REQ, system_cmd::WDU_INFO, vec![0, 0, 0])
}

/// Fixed bus subscription frame sent during the connection handshake.
pub fn subscribe_bus(bus: BusClass) -> Frame {
    let cmd = match bus {
        BusClass::Mfd => 0x00,
        BusClass::Nmea => 0x01,
    };
    Frame::new(msg_type::SUBSCRIPTION_REQUEST, cmd, vec![0, 0])
}

/// Momentary press (`pressed == true`) or release command for a channel.
pub fn momentary(signal_id: u16, pressed: bool) -> Frame {
    Frame::new(
        msg_type::MFD_CONTROL,
        channel_cmd::MOMENTARY,
        vec![
            (signal_id & 0xff) as u8,
            (signal_id >> 8) as u8,
            u8::from(pressed),
        ],
    )
}

/// Dimmer level update. `level` is clamped to `0..=1000`; the status byte is
/// 1 (off) exactly when the clamped level is zero.
pub fn dimmer(signal_id: u16, level: i32) -> Frame {
    let level = level.clamp(0, 1000) as u16;
    let status_byte = u8::from(level == 0);
    Frame::new(
        msg_type::MFD_CONTROL,
        channel_cmd::DIMMER_UPDATE,
        vec![
            (signal_id & 0xff) as u8,
            (signal_id >> 8) as u8,
            status_byte,
            (level & 0xff) as u8,
            (level >> 8) as u8,
        ],
    )
}

/// Latching toggle command (compatibility path for MultiPlus controls).
pub fn toggle(signal_id: u16) -> Frame {
    Frame::new(
        msg_type::MFD_CONTROL,
        channel_cmd::TOGGLE,
        vec![(signal_id & 0xff) as u8, (signal_id >> 8) as u8, 0x04],
    )
}

/// Force a channel on or off.
pub fn force(signal_id: u16, is_on: bool) -> Frame {
    Frame::new(
        msg_type::MFD_CONTROL,
        channel_cmd::SETPOINT,
        vec![
            (signal_id & 0xff) as u8,
            (signal_id >> 8) as u8,
            u8::from(is_on),
        ],
    )
}

/// Set the shore-power AC current limit, in amps.
pub fn ac_limit(limit: u8) -> Frame {
    Frame::new(msg_type::MFD_CONTROL, channel_cmd::SETPOINT, vec![12, 0, limit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_ack_shape() {
        let frame = heartbeat_ack();
        assert_eq!(frame.message_type, 128);
        assert_eq!(frame.message_cmd, 0);
        assert_eq!(frame.size, 1);
        assert_eq!(frame.data, vec![0]);
    }

    #[test]
    fn info_request_shape() {
        let frame = request_device_info();
        assert_eq!(
            (frame.message_type, frame.message_cmd, frame.size),
            (49, 1, 3)
        );
        assert_eq!(frame.data, vec![0, 0, 0]);
    }

    #[test]
    fn momentary_press_and_release() {
        let press = momentary(300, true);
        assert_eq!(press.data, vec![0x2c, 0x01, 1]);
        let release = momentary(300, false);
        assert_eq!(release.data, vec![0x2c, 0x01, 0]);
        assert_eq!((press.message_type, press.message_cmd), (17, 1));
    }

    #[test]
    fn dimmer_status_byte_marks_zero_level_off() {
        let off = dimmer(10, 0);
        assert_eq!(off.data, vec![10, 0, 1, 0, 0]);

        let full = dimmer(10, 1000);
        assert_eq!(full.data, vec![10, 0, 0, 232, 3]);
        assert_eq!((full.message_type, full.message_cmd, full.size), (17, 3, 5));
    }

    #[test]
    fn dimmer_clamps_out_of_range_levels() {
        assert_eq!(dimmer(10, 5000).data, vec![10, 0, 0, 232, 3]);
        assert_eq!(dimmer(10, -3).data, vec![10, 0, 1, 0, 0]);
    }

    #[test]
    fn toggle_uses_compatibility_payload() {
        assert_eq!(toggle(7).data, vec![7, 0, 0x04]);
        assert_eq!(toggle(7).message_cmd, 0);
    }

    #[test]
    fn force_and_ac_limit_share_the_setpoint_command() {
        assert_eq!(force(9, true).data, vec![9, 0, 1]);
        assert_eq!(force(9, false).data, vec![9, 0, 0]);
        assert_eq!(ac_limit(30).data, vec![12, 0, 30]);
        assert_eq!(ac_limit(30).message_cmd, 4);
    }

    #[test]
    fn bus_subscriptions_use_fixed_payload() {
        let mfd = subscribe_bus(BusClass::Mfd);
        let nmea = subscribe_bus(BusClass::Nmea);
        assert_eq!((mfd.message_type, mfd.message_cmd), (0x60, 0x00));
        assert_eq!((nmea.message_type, nmea.message_cmd), (0x60, 0x01));
        assert_eq!(mfd.data, vec![0, 0]);
    }
}
