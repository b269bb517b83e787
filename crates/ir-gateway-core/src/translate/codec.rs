//! Encoding of received frames and validation of inbound commands.
//!
//! # Inbound command rules
//!
//! A command payload must be a JSON object carrying:
//!
//! | Key         | JSON type          | Rejected when                              |
//! |-------------|--------------------|--------------------------------------------|
//! | `protocol`  | string             | absent, `null`, or `""`                    |
//! | `data`      | string (hex)       | absent, `null`, `""`, or not hexadecimal   |
//! | `bitLength` | integer or string  | absent, `null`, `""`, `0`, or above 64     |
//!
//! and the value must fit in `bitLength` bits.  Additional keys are ignored.
//! An unrecognised `protocol` string is *not* an error; it resolves to
//! [`Protocol::Unknown`].
//!
//! # Repeats
//!
//! The wire record has no repeat flag.  A held-button repeat is published
//! exactly like the press that started it, so replaying any event as a
//! command reproduces the original frame.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::frame::{IrFrame, Protocol, MAX_BIT_LENGTH};
use crate::translate::message::GatewayMessage;

/// Why an inbound command payload was rejected.
///
/// Every variant is recovered locally by the gateway: the command is logged
/// and dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedCommand {
    /// The payload is not valid JSON, or a field has the wrong JSON type.
    #[error("payload is not valid command JSON: {0}")]
    InvalidJson(String),

    /// The payload is valid JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A required field is absent, `null`, empty, or zero.
    #[error("field `{0}` is missing, empty or zero")]
    MissingField(&'static str),

    /// `data` is not a hexadecimal number that fits in 64 bits.
    #[error("field `data` is not a 64-bit hexadecimal value: {0:?}")]
    InvalidData(String),

    /// `bitLength` is text that is not a decimal number.
    #[error("field `bitLength` is not a number: {0:?}")]
    InvalidBitLength(String),

    /// `bitLength` is larger than 64.
    #[error("field `bitLength` is {0}, the maximum is 64")]
    BitLengthOutOfRange(u64),

    /// `value` has significant bits above `bitLength`.
    #[error("value 0x{value:X} does not fit in {bit_length} bits")]
    ValueTooWide { value: u64, bit_length: u8 },
}

/// Converts a received frame into its wire record.
///
/// Infallible: the protocol name is copied verbatim, the value rendered as
/// uppercase hex without padding, and the bit length in decimal.
///
/// ```rust
/// use ir_gateway_core::{encode_frame, IrFrame, Protocol};
///
/// let msg = encode_frame(&IrFrame::new(Protocol::Sony, 0xA90, 12));
/// assert_eq!(msg.data, "A90");
/// assert_eq!(msg.bit_length, "12");
/// ```
pub fn encode_frame(frame: &IrFrame) -> GatewayMessage {
    if frame.is_repeat {
        debug!(protocol = %frame.protocol, "encoding repeat frame without repeat marker");
    }
    GatewayMessage {
        protocol: frame.protocol.name().to_string(),
        data: format!("{:X}", frame.value),
        bit_length: frame.bit_length.to_string(),
    }
}

/// Decodes and validates an inbound command payload.
///
/// # Errors
///
/// Returns [`MalformedCommand`] describing the first rule the payload breaks
/// (see the module docs).
pub fn decode_command(payload: &[u8]) -> Result<IrFrame, MalformedCommand> {
    // Parse to a Value first: a derived struct would also accept a JSON array
    // and bind its elements by position.
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| MalformedCommand::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(MalformedCommand::NotAnObject);
    }
    let raw = CommandPayload::deserialize(value)
        .map_err(|e| MalformedCommand::InvalidJson(e.to_string()))?;

    let protocol_name = non_empty(raw.protocol, "protocol")?;
    let data = non_empty(raw.data, "data")?;
    let bit_length = parse_bit_length(raw.bit_length)?;
    let value = parse_hex(&data)?;

    let frame = IrFrame::new(Protocol::from_name(&protocol_name), value, bit_length);
    if !frame.is_well_formed() {
        return Err(MalformedCommand::ValueTooWide { value, bit_length });
    }

    if frame.protocol.is_unknown() {
        debug!(name = %protocol_name, "unrecognised protocol name; forwarding as UNKNOWN");
    }

    Ok(frame)
}

// ── Raw payload shape ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CommandPayload {
    protocol: Option<String>,
    data: Option<String>,
    #[serde(rename = "bitLength")]
    bit_length: Option<BitLengthField>,
}

/// `bitLength` as either a JSON integer or numeric text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BitLengthField {
    Number(u64),
    Text(String),
}

fn non_empty(field: Option<String>, name: &'static str) -> Result<String, MalformedCommand> {
    match field {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(MalformedCommand::MissingField(name)),
    }
}

fn parse_bit_length(field: Option<BitLengthField>) -> Result<u8, MalformedCommand> {
    let bits = match field {
        None => return Err(MalformedCommand::MissingField("bitLength")),
        Some(BitLengthField::Number(n)) => n,
        Some(BitLengthField::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(MalformedCommand::MissingField("bitLength"));
            }
            trimmed
                .parse::<u64>()
                .map_err(|_| MalformedCommand::InvalidBitLength(text.clone()))?
        }
    };

    // Zero counts as "absent".
    if bits == 0 {
        return Err(MalformedCommand::MissingField("bitLength"));
    }
    if bits > u64::from(MAX_BIT_LENGTH) {
        return Err(MalformedCommand::BitLengthOutOfRange(bits));
    }
    Ok(bits as u8)
}

fn parse_hex(data: &str) -> Result<u64, MalformedCommand> {
    let digits = data
        .strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .unwrap_or(data);

    // from_str_radix would also accept a leading '+'.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MalformedCommand::InvalidData(data.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| MalformedCommand::InvalidData(data.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
