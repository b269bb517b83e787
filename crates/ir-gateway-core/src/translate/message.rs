//! The JSON record exchanged with the bus.

use serde::{Deserialize, Serialize};

/// Wire payload of an IR event.
///
/// Field order is preserved by serde, so a SONY frame serializes as:
///
/// ```json
/// {"protocol":"SONY","data":"A90","bitLength":"12"}
/// ```
///
/// `bitLength` is published as text.  Inbound commands may use either text or
/// a JSON integer; that leniency lives in
/// [`decode_command`](crate::translate::codec::decode_command), not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Protocol wire name, e.g. `"NEC"`.
    pub protocol: String,
    /// Value as uppercase hexadecimal without prefix or padding.
    pub data: String,
    /// Number of significant bits, in decimal.
    #[serde(rename = "bitLength")]
    pub bit_length: String,
}

impl GatewayMessage {
    /// Serializes the message to its compact JSON form.
    ///
    /// # Errors
    ///
    /// Propagates the serializer error; a record of three strings does not
    /// produce one in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
