//! State of the single message-bus connection.

use std::fmt;

/// Where the gateway is in its connection lifecycle.
///
/// ```text
///              ensure_connected()
/// Disconnected ──────────────────▶ Connecting
///      ▲  ▲                           │
///      │  └──── handshake failed ─────┤
///      │                              │ handshake ok
///      └──── transport lost ──── Connected ◀┘
/// ```
///
/// There is no terminal state: the gateway keeps cycling for as long as the
/// process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection.  The initial state.
    #[default]
    Disconnected,
    /// A connect handshake is in progress.
    Connecting,
    /// Handshake done, presence published, command topic subscribed.
    Connected,
}

impl ConnectionState {
    /// Returns `true` only in the [`ConnectionState::Connected`] state.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}
