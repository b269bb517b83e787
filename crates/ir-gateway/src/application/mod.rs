//! Application layer for the gateway.
//!
//! The application layer knows *what* the gateway does, and reaches the
//! outside world only through traits that the infrastructure layer
//! implements:
//!
//! - **`bus`** – the [`MessageBus`] trait (connect, publish, subscribe,
//!   service I/O) and its option/error types.
//!
//! - **`transmit`** – the [`IrTransceiver`] trait and the [`TransmitGuard`]
//!   that keeps the receiver disabled while the device is transmitting.
//!
//! - **`presence`** – the [`PresenceManager`]: the connection state machine,
//!   the retained online/offline message, and the fixed reconnect backoff.
//!
//! - **`gateway`** – the [`Gateway`] aggregate that owns the bus, the
//!   transceiver and the presence manager and runs the per-tick loop.

pub mod bus;
pub mod gateway;
pub mod presence;
pub mod transmit;

pub use bus::{BusError, ConnectOptions, InboundMessage, LastWill, MessageBus, QoS};
pub use gateway::{CommandOutcome, Gateway, TickReport};
pub use presence::{Clock, PresenceManager};
pub use transmit::{IrTransceiver, TransceiverError, TransmitGuard};
