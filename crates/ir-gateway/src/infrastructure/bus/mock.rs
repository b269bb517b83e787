//! In-memory message bus for tests.
//!
//! `MockBus` records every connect, publish and subscribe so tests can assert
//! on exactly what went over the wire and in which order.  Failures are
//! scripted with the `fail_next_*` methods; a lost transport is simulated
//! with [`MockBus::drop_connection`].
//!
//! ```ignore
//! let mut bus = MockBus::new();
//! bus.fail_next_connects(2);
//! bus.push_inbound(InboundMessage::new("home/ir/command", payload));
//!
//! gateway.tick().await;
//! assert_eq!(bus.connects.len(), 3);
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::application::{BusError, ConnectOptions, InboundMessage, MessageBus, QoS};

/// One recorded publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// A message bus that records all calls without any network I/O.
#[derive(Debug, Default)]
pub struct MockBus {
    /// Options passed to every `connect` call, including failed ones.
    pub connects: Vec<ConnectOptions>,
    /// Successful publishes, in order.
    pub published: Vec<PublishedMessage>,
    /// Successfully subscribed topics, in order.
    pub subscriptions: Vec<String>,
    /// Number of `disconnect` calls.
    pub disconnects: u32,
    connected: bool,
    inbound: VecDeque<InboundMessage>,
    failing_connects: u32,
    failing_subscribes: u32,
    failing_publishes: u32,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` connect attempts are refused.
    pub fn fail_next_connects(&mut self, n: u32) {
        self.failing_connects = n;
    }

    /// The next `n` subscribe requests fail.
    pub fn fail_next_subscribes(&mut self, n: u32) {
        self.failing_subscribes = n;
    }

    /// The next `n` publishes fail without dropping the connection.
    pub fn fail_next_publishes(&mut self, n: u32) {
        self.failing_publishes = n;
    }

    /// Queues a message for the next `service_io` call.
    pub fn push_inbound(&mut self, message: InboundMessage) {
        self.inbound.push_back(message);
    }

    /// Simulates the transport dying underneath the client.  No clean
    /// disconnect takes place, so a real broker would publish the last will.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }

    /// The last will registered by the most recent connect attempt.
    pub fn last_will(&self) -> Option<&crate::application::LastWill> {
        self.connects.last().map(|options| &options.last_will)
    }

    /// Publishes recorded on `topic`, in order.
    pub fn published_on(&self, topic: &str) -> Vec<&PublishedMessage> {
        self.published.iter().filter(|m| m.topic == topic).collect()
    }
}

#[async_trait]
impl MessageBus for MockBus {
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), BusError> {
        self.connects.push(options.clone());
        self.connected = false;
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(BusError::ConnectFailed {
                addr: "mock:1883".to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), BusError> {
        if !self.connected {
            return Err(BusError::NotConnected);
        }
        if self.failing_publishes > 0 {
            self.failing_publishes -= 1;
            return Err(BusError::Request("scripted publish failure".to_string()));
        }
        self.published.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, _qos: QoS) -> Result<(), BusError> {
        if !self.connected {
            return Err(BusError::NotConnected);
        }
        if self.failing_subscribes > 0 {
            self.failing_subscribes -= 1;
            return Err(BusError::Request("scripted subscribe failure".to_string()));
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn service_io(&mut self) -> Result<Vec<InboundMessage>, BusError> {
        if !self.connected {
            return Err(BusError::ConnectionLost("transport closed".to_string()));
        }
        Ok(self.inbound.drain(..).collect())
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.disconnects += 1;
        self.connected = false;
        Ok(())
    }
}
