//! The IR transceiver port and scoped transmit mode.
//!
//! # Why disable the receiver while sending?
//!
//! The IR LED and the IR receiver sit on the same board.  Without
//! precautions, every command the gateway emits is picked up by its own
//! receiver a few milliseconds later and published back to the bus as if a
//! remote had sent it.  [`TransmitGuard`] switches reception off for exactly
//! the duration of a send and switches it back on when dropped, so every
//! exit path (success, error, early return) re-enables the receiver.

use ir_gateway_core::{IrFrame, Protocol};
use thiserror::Error;

/// Errors reported by an [`IrTransceiver`] send.
#[derive(Debug, Error)]
pub enum TransceiverError {
    /// The backend cannot encode this protocol.
    #[error("protocol {0} is not supported by this transceiver")]
    UnsupportedProtocol(Protocol),

    /// The hardware or driver failed.
    #[error("transceiver device error: {0}")]
    Device(String),
}

/// Receive and send side of an IR transceiver.
///
/// The receive side behaves like a lazy, infinite, non-restartable stream:
/// [`try_receive`](IrTransceiver::try_receive) polls without blocking, and
/// after a frame has been taken the receiver must be re-armed with
/// [`resume`](IrTransceiver::resume).
pub trait IrTransceiver: Send {
    /// Returns the next decoded frame, if one is ready.
    fn try_receive(&mut self) -> Option<IrFrame>;

    /// Re-arms the receiver after a frame was taken.
    fn resume(&mut self);

    /// Stops decoding incoming signals.
    fn disable(&mut self);

    /// Resumes decoding incoming signals.
    fn enable(&mut self);

    /// Emits `frame`.  `frame.is_repeat` is ignored.
    fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError>;
}

impl<T: IrTransceiver + ?Sized> IrTransceiver for Box<T> {
    fn try_receive(&mut self) -> Option<IrFrame> {
        (**self).try_receive()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn disable(&mut self) {
        (**self).disable()
    }

    fn enable(&mut self) {
        (**self).enable()
    }

    fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError> {
        (**self).send(frame)
    }
}

/// Receiver-off window around one transmission.
///
/// ```ignore
/// let mut guard = TransmitGuard::acquire(&mut transceiver); // disable()
/// guard.send(&frame)?;
/// // guard dropped here → enable()
/// ```
pub struct TransmitGuard<'a, T: IrTransceiver + ?Sized> {
    transceiver: &'a mut T,
}

impl<'a, T: IrTransceiver + ?Sized> TransmitGuard<'a, T> {
    /// Disables reception and returns the guard.
    pub fn acquire(transceiver: &'a mut T) -> Self {
        transceiver.disable();
        Self { transceiver }
    }

    /// Sends `frame` while reception is disabled.
    pub fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError> {
        self.transceiver.send(frame)
    }
}

impl<T: IrTransceiver + ?Sized> Drop for TransmitGuard<'_, T> {
    fn drop(&mut self) {
        self.transceiver.enable();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
