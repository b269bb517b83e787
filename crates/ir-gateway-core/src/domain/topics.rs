//! MQTT topic layout derived from a single base topic.
//!
//! | Topic          | Direction | Retained | Payload                  |
//! |----------------|-----------|----------|--------------------------|
//! | `T`            | publish   | no       | IR event JSON            |
//! | `T/command`    | subscribe | –        | IR command JSON          |
//! | `T/online`     | publish   | yes      | `"true"` / `"false"`     |
//!
//! `T/online` is also registered as the connection's last will with payload
//! `"false"`, so the broker flips it for us when the device vanishes.

/// Presence payload published (retained) after every successful connect.
pub const ONLINE_PAYLOAD: &str = "true";

/// Presence payload registered as the last will, and published on a clean
/// shutdown.
pub const OFFLINE_PAYLOAD: &str = "false";

const COMMAND_SUFFIX: &str = "/command";
const ONLINE_SUFFIX: &str = "/online";

/// The three topic names the gateway uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    event: String,
    command: String,
    online: String,
}

impl Topics {
    /// Derives the topic names from `base`.
    ///
    /// ```rust
    /// use ir_gateway_core::Topics;
    ///
    /// let topics = Topics::from_base("home/livingroom/ir");
    /// assert_eq!(topics.command(), "home/livingroom/ir/command");
    /// ```
    pub fn from_base(base: impl Into<String>) -> Self {
        let event = base.into();
        Self {
            command: format!("{event}{COMMAND_SUFFIX}"),
            online: format!("{event}{ONLINE_SUFFIX}"),
            event,
        }
    }

    /// Topic IR events are published to (the base topic itself).
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Topic inbound IR commands arrive on.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Retained presence topic, also the last-will topic.
    pub fn online(&self) -> &str {
        &self.online
    }
}
