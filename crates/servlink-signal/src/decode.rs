//! ---
//! sl_section: "02-signal-model"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Signal metadata, conversion, decoding and formatting."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use std::sync::Arc;

use chrono::{DateTime, Utc};

use servlink_proto::{channel_cmd, msg_type, Frame};

use crate::convert::convert_raw;
use crate::metadata::SignalCatalog;

/// Classification of a decoded signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Periodic channel status update.
    StatusUpdate,
    /// Button state change.
    ButtonState,
    /// NMEA marine-data value.
    Nmea,
    /// Channel information response.
    ChannelInfo,
    /// Any other command within a status frame.
    Unknown,
}

/// One decoded signal value, created fresh per frame and handed to
/// subscribers by reference. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSignal {
    /// Signal identifier on the control bus.
    pub signal_id: u16,
    /// What the frame represented.
    pub kind: SignalKind,
    /// Value-type identifier carried alongside the value.
    pub value_type_id: u16,
    /// Raw little-endian value from the wire.
    pub raw_value: i32,
    /// Unit-converted value.
    pub value: f64,
    /// Set when the device flags the value as unavailable.
    pub unavailable: bool,
    /// Decode timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Decoder from classified frames to [`DomainSignal`] objects.
///
/// Frames shorter than the seven bytes a shape requires decode to `None`;
/// longer payloads are tolerated.
#[derive(Debug, Clone)]
pub struct SignalDecoder {
    catalog: Arc<SignalCatalog>,
}

impl SignalDecoder {
    /// Create a decoder over the shared metadata catalog.
    pub fn new(catalog: Arc<SignalCatalog>) -> Self {
        Self { catalog }
    }

    /// Access the underlying catalog.
    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    /// Decode an MFD status frame (`messagetype` 16).
    pub fn decode_status(&self, frame: &Frame) -> Option<DomainSignal> {
        if frame.message_type != msg_type::MFD_STATUS || frame.data.len() < 7 {
            return None;
        }
        let signal_id = frame.signal_id()?;
        let kind = match frame.message_cmd {
            channel_cmd::STATUS_UPDATE => SignalKind::StatusUpdate,
            channel_cmd::TOGGLE | channel_cmd::MOMENTARY => SignalKind::ButtonState,
            _ => SignalKind::Unknown,
        };
        Some(self.build(frame, signal_id, kind, u16::from(frame.data[3])))
    }

    /// Decode an NMEA value frame (`messagecmd` 1).
    pub fn decode_nmea(&self, frame: &Frame) -> Option<DomainSignal> {
        if frame.message_cmd != 1 || frame.data.len() < 7 {
            return None;
        }
        let signal_id = frame.signal_id()?;
        let value_type = u16::from(frame.data[3]) | (u16::from(frame.data[4]) << 8);
        Some(self.build(frame, signal_id, SignalKind::Nmea, value_type))
    }

    /// Decode a channel information frame (`messagetype` 32, `messagecmd` 100).
    pub fn decode_channel_info(&self, frame: &Frame) -> Option<DomainSignal> {
        if frame.message_type != msg_type::CHANNEL_INFO
            || frame.message_cmd != 100
            || frame.data.len() < 7
        {
            return None;
        }
        let signal_id = frame.signal_id()?;
        Some(self.build(frame, signal_id, SignalKind::ChannelInfo, 0))
    }

    fn build(&self, frame: &Frame, signal_id: u16, kind: SignalKind, value_type_id: u16) -> DomainSignal {
        // Minimum length is 7; a seven-byte payload zero-extends its top byte.
        let raw_value = frame.raw_i32(4).unwrap_or_else(|| {
            let b = &frame.data;
            i32::from_le_bytes([b[4], b[5], b[6], 0])
        });
        let format = self.catalog.format_type(signal_id);
        DomainSignal {
            signal_id,
            kind,
            value_type_id,
            raw_value,
            value: convert_raw(format, raw_value),
            unavailable: frame.data[2] & 0x80 != 0,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SignalRecord;

    fn decoder_with(signal_id: u16, format_type: u8) -> SignalDecoder {
        SignalDecoder::new(Arc::new(SignalCatalog::from_records([SignalRecord {
            signal_id,
            data_type: 0,
            description: String::new(),
            channel_type: 5,
            data_item_format_type: format_type,
            channel_setting_type: 0,
        }])))
    }

    fn status_frame(signal_id: u16, cmd: u8, flags: u8, raw: i32) -> Frame {
        let mut data = vec![
            (signal_id & 0xff) as u8,
            (signal_id >> 8) as u8,
            flags,
            0,
        ];
        data.extend_from_slice(&raw.to_le_bytes());
        Frame::new(16, cmd, data)
    }

    #[test]
    fn status_decode_extracts_all_fields() {
        let decoder = decoder_with(300, 0);
        let signal = decoder
            .decode_status(&status_frame(300, 5, 0, 1234))
            .expect("decodes");
        assert_eq!(signal.signal_id, 300);
        assert_eq!(signal.kind, SignalKind::StatusUpdate);
        assert_eq!(signal.raw_value, 1234);
        assert!((signal.value - 1234.0).abs() < 1e-9);
        assert!(!signal.unavailable);
    }

    #[test]
    fn unavailable_flag_is_the_high_bit_of_byte_two() {
        let decoder = decoder_with(7, 0);
        let signal = decoder
            .decode_status(&status_frame(7, 5, 0x80, 0))
            .expect("decodes");
        assert!(signal.unavailable);

        let signal = decoder
            .decode_status(&status_frame(7, 5, 0x7f, 0))
            .expect("decodes");
        assert!(!signal.unavailable);
    }

    #[test]
    fn short_frames_decode_to_none() {
        let decoder = decoder_with(7, 0);
        let short = Frame::new(16, 5, vec![7, 0, 1]);
        assert!(decoder.decode_status(&short).is_none());
        assert!(decoder.decode_nmea(&Frame::new(0x52, 1, vec![7, 0])).is_none());
        assert!(decoder
            .decode_channel_info(&Frame::new(32, 100, vec![7, 0, 0]))
            .is_none());
    }

    #[test]
    fn wrong_shape_decodes_to_none() {
        let decoder = decoder_with(7, 0);
        let not_status = Frame::new(17, 5, vec![0; 8]);
        assert!(decoder.decode_status(&not_status).is_none());
        let wrong_cmd = Frame::new(32, 99, vec![0; 8]);
        assert!(decoder.decode_channel_info(&wrong_cmd).is_none());
        let not_nmea = Frame::new(0x52, 2, vec![0; 8]);
        assert!(decoder.decode_nmea(&not_nmea).is_none());
    }

    #[test]
    fn conversion_uses_catalog_format_type() {
        let decoder = decoder_with(34, 22);
        let signal = decoder
            .decode_status(&status_frame(34, 5, 0, 295_372))
            .expect("decodes");
        // 295.372 K is roughly 72 °F.
        assert!((signal.value - 72.0).abs() < 0.05);
    }

    #[test]
    fn nmea_value_type_is_sixteen_bits() {
        let decoder = decoder_with(12, 0);
        let frame = Frame::new(0x52, 1, vec![12, 0, 0, 0x34, 0x12, 0, 0, 0]);
        let signal = decoder.decode_nmea(&frame).expect("decodes");
        assert_eq!(signal.kind, SignalKind::Nmea);
        assert_eq!(signal.value_type_id, 0x1234);
    }

    #[test]
    fn status_cmd_maps_to_signal_kind() {
        let decoder = decoder_with(7, 0);
        for (cmd, kind) in [
            (0, SignalKind::ButtonState),
            (1, SignalKind::ButtonState),
            (5, SignalKind::StatusUpdate),
            (9, SignalKind::Unknown),
        ] {
            let signal = decoder
                .decode_status(&status_frame(7, cmd, 0, 0))
                .expect("decodes");
            assert_eq!(signal.kind, kind);
        }
    }
}
