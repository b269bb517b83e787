//! # ir-gateway-core
//!
//! Shared library for the IR-MQTT gateway containing the IR frame model, the
//! MQTT topic layout, and the JSON translation between IR frames and bus
//! payloads.
//!
//! It has zero dependencies on sockets, async runtimes, or IR hardware, so the
//! translation rules can be tested (and benchmarked) in isolation.
//!
//! # What does the gateway do? (for beginners)
//!
//! A small always-on device sits next to the TV.  It listens for infrared
//! signals from physical remote controls and reports each one on an MQTT
//! topic, and it accepts MQTT commands telling it to *emit* an infrared
//! signal.  A home-automation controller on the other side of the broker can
//! therefore both observe and drive any IR-controlled appliance.
//!
//! This crate defines:
//!
//! - **`domain`** – [`IrFrame`] (one decoded or to-be-sent signal), the
//!   [`Protocol`] name table, the [`Topics`] derived from one base topic, and
//!   the [`ConnectionState`] of the bus connection.
//!
//! - **`translate`** – [`encode_frame`] turns a received frame into a
//!   [`GatewayMessage`]; [`decode_command`] validates an inbound command
//!   payload and turns it back into a frame, or reports [`MalformedCommand`].

pub mod domain;
pub mod translate;

pub use domain::connection::ConnectionState;
pub use domain::frame::{IrFrame, Protocol};
pub use domain::topics::{Topics, OFFLINE_PAYLOAD, ONLINE_PAYLOAD};
pub use translate::codec::{decode_command, encode_frame, MalformedCommand};
pub use translate::message::GatewayMessage;
