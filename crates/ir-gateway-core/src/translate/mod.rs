//! Translation between IR frames and MQTT JSON payloads.
//!
//! ```text
//! IrFrame ──encode_frame──▶ GatewayMessage ──to_json──▶ {"protocol":…,"data":…,"bitLength":…}
//! payload ──decode_command──▶ Result<IrFrame, MalformedCommand>
//! ```
//!
//! Both directions are pure functions; nothing here touches the network or the
//! transceiver.

pub mod codec;
pub mod message;

pub use codec::{decode_command, encode_frame, MalformedCommand};
pub use message::GatewayMessage;
