//! Transceiver without hardware.
//!
//! `DryRunTransceiver` lets the gateway run end-to-end against a real broker
//! on a machine with no IR LED or receiver.  Sends are logged and counted,
//! nothing is ever received, and the only state is a flag and a counter, so
//! it can run for as long as the daemon does.

use ir_gateway_core::IrFrame;
use tracing::info;

use crate::application::{IrTransceiver, TransceiverError};

#[derive(Debug)]
pub struct DryRunTransceiver {
    enabled: bool,
    transmitted: u64,
}

impl Default for DryRunTransceiver {
    fn default() -> Self {
        Self {
            enabled: true,
            transmitted: 0,
        }
    }
}

impl DryRunTransceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames accepted by `send` so far.
    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl IrTransceiver for DryRunTransceiver {
    fn try_receive(&mut self) -> Option<IrFrame> {
        None
    }

    fn resume(&mut self) {}

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    /// Logs the frame.  `UNKNOWN` is refused, as a hardware encoder would.
    fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError> {
        if frame.protocol.is_unknown() {
            return Err(TransceiverError::UnsupportedProtocol(frame.protocol));
        }
        self.transmitted += 1;
        info!(
            protocol = %frame.protocol,
            value = %format!("{:X}", frame.value),
            bits = frame.bit_length,
            "dry-run transmit"
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
