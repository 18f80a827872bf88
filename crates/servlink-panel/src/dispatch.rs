//! ---
//! sl_section: "04-panel-ui"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Frame dispatch, state reconciliation and UI binding."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
//! Frame classification and subscriber dispatch.
//!
//! Subscribers register per signal id against one of two registries, MFD
//! status or NMEA marine data. Registration order is preserved and a failing
//! subscriber never prevents the rest from running.

use indexmap::IndexMap;
use tracing::{trace, warn};

use servlink_proto::{classify, Frame, FrameKind};
use servlink_signal::{DomainSignal, SignalDecoder};

use crate::surface::Surface;

/// Which registry a subscription targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    /// MFD status and channel information frames.
    Mfd,
    /// NMEA marine-data frames.
    Nmea,
}

/// Callback invoked with each decoded signal for a subscribed id.
pub type SignalCallback =
    Box<dyn FnMut(&DomainSignal, &mut dyn Surface) -> anyhow::Result<()> + Send>;

/// Routes classified frames to decoded-signal subscribers.
pub struct Dispatcher {
    decoder: SignalDecoder,
    mfd: IndexMap<u16, Vec<SignalCallback>>,
    nmea: IndexMap<u16, Vec<SignalCallback>>,
}

impl Dispatcher {
    /// Create a dispatcher over the given decoder.
    pub fn new(decoder: SignalDecoder) -> Self {
        Self {
            decoder,
            mfd: IndexMap::new(),
            nmea: IndexMap::new(),
        }
    }

    /// The decoder in use.
    pub fn decoder(&self) -> &SignalDecoder {
        &self.decoder
    }

    /// Register a callback for one signal id in one registry.
    pub fn subscribe(&mut self, signal_id: u16, class: SignalClass, callback: SignalCallback) {
        let registry = match class {
            SignalClass::Mfd => &mut self.mfd,
            SignalClass::Nmea => &mut self.nmea,
        };
        registry.entry(signal_id).or_default().push(callback);
    }

    /// Classify a frame, decode it and notify subscribers.
    ///
    /// Heartbeats, acknowledgements and control echoes carry no signal value
    /// and are not routed here. Unrecognized frames are dropped with a trace.
    pub fn route(&mut self, frame: &Frame, surface: &mut dyn Surface) {
        let decoded = match classify(frame) {
            FrameKind::MfdStatus => self.decoder.decode_status(frame).map(|s| (SignalClass::Mfd, s)),
            FrameKind::ChannelInfo => self
                .decoder
                .decode_channel_info(frame)
                .map(|s| (SignalClass::Mfd, s)),
            FrameKind::Nmea => self.decoder.decode_nmea(frame).map(|s| (SignalClass::Nmea, s)),
            FrameKind::HeartbeatRequest
            | FrameKind::Acknowledgement
            | FrameKind::ControlEcho { .. } => None,
            FrameKind::Unrecognized {
                message_type,
                message_cmd,
            } => {
                trace!(message_type, message_cmd, "dropping unrecognized frame");
                None
            }
        };
        if let Some((class, signal)) = decoded {
            self.notify(class, &signal, surface);
        }
    }

    fn notify(&mut self, class: SignalClass, signal: &DomainSignal, surface: &mut dyn Surface) {
        let registry = match class {
            SignalClass::Mfd => &mut self.mfd,
            SignalClass::Nmea => &mut self.nmea,
        };
        let Some(callbacks) = registry.get_mut(&signal.signal_id) else {
            return;
        };
        for callback in callbacks {
            if let Err(error) = callback(signal, surface) {
                warn!(signal = signal.signal_id, %error, "signal subscriber failed");
            }
        }
    }
}
