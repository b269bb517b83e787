//! Scriptable in-memory IR transceiver.
//!
//! `MockTransceiver` stands in for real IR hardware.  Tests queue frames with
//! [`MockTransceiver::push_frame`] and inspect every call afterwards through
//! [`MockTransceiver::calls`].  Every call is kept for the lifetime of the
//! mock, so it is for tests only; the binary runs the `dry_run` backend.
//!
//! It models the receiver's two hardware rules:
//!
//! - after a frame is delivered, nothing more arrives until `resume()`;
//! - while disabled (transmitting), nothing arrives at all.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every `send` return
//! `TransceiverError::Device`.

use std::collections::VecDeque;

use ir_gateway_core::IrFrame;
use crate::application::{IrTransceiver, TransceiverError};

/// One recorded call on the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransceiverCall {
    /// `try_receive` delivered this frame.
    Received(IrFrame),
    Resume,
    Disable,
    Enable,
    /// `send` was called with this frame (whether or not it failed).
    Send(IrFrame),
}

/// A transceiver that records all calls without touching hardware.
#[derive(Debug)]
pub struct MockTransceiver {
    pending: VecDeque<IrFrame>,
    calls: Vec<TransceiverCall>,
    enabled: bool,
    awaiting_resume: bool,
    /// When `true`, `send` fails with a device error.
    pub should_fail: bool,
}

impl Default for MockTransceiver {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            calls: Vec::new(),
            enabled: true,
            awaiting_resume: false,
            should_fail: false,
        }
    }
}

impl MockTransceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a frame as if it had just been decoded off the air.
    pub fn push_frame(&mut self, frame: IrFrame) {
        self.pending.push_back(frame);
    }

    pub fn calls(&self) -> &[TransceiverCall] {
        &self.calls
    }

    /// Frames passed to `send`, in order.
    pub fn sent(&self) -> Vec<IrFrame> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                TransceiverCall::Send(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl IrTransceiver for MockTransceiver {
    fn try_receive(&mut self) -> Option<IrFrame> {
        if !self.enabled || self.awaiting_resume {
            return None;
        }
        let frame = self.pending.pop_front()?;
        self.awaiting_resume = true;
        self.calls.push(TransceiverCall::Received(frame));
        Some(frame)
    }

    fn resume(&mut self) {
        self.awaiting_resume = false;
        self.calls.push(TransceiverCall::Resume);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.calls.push(TransceiverCall::Disable);
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.calls.push(TransceiverCall::Enable);
    }

    fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError> {
        self.calls.push(TransceiverCall::Send(*frame));
        if self.should_fail {
            return Err(TransceiverError::Device("mock failure".into()));
        }
        Ok(())
    }
}
