//! MQTT adapter over `rumqttc`.
//!
//! Architecture:
//! - `MqttBus` owns at most one `Session` (an `AsyncClient` and its
//!   `EventLoop`).
//! - `connect` builds a fresh session and polls the event loop until the
//!   broker's `ConnAck`, bounded by the configured connect timeout.
//! - Publishes are queued on the client without waiting; the event loop
//!   sends them during the next `service_io`.
//! - `subscribe` drives the event loop until the broker's `SubAck`.  A
//!   refused subscription drops the session, so the handshake fails and the
//!   presence manager backs off and retries.  Publishes that arrive while
//!   waiting are buffered for the next `service_io`.
//! - Any `ConnectionError` tears the session down.  `rumqttc` would reconnect
//!   on its own if polled again; the presence manager owns reconnection, so
//!   the session is dropped instead.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, SubscribeReasonCode,
};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::application::{BusError, ConnectOptions, InboundMessage, MessageBus, QoS};
use crate::domain::GatewayConfig;

/// Capacity of the client's request queue.
const REQUEST_CAPACITY: usize = 32;

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// [`MessageBus`] backed by one MQTT broker connection.
pub struct MqttBus {
    host: String,
    port: u16,
    connect_timeout: Duration,
    poll_interval: Duration,
    session: Option<Session>,
    /// Publishes received while waiting for a `SubAck`.
    buffered: Vec<InboundMessage>,
}

impl MqttBus {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            host: config.broker_host.clone(),
            port: config.broker_port,
            connect_timeout: config.connect_timeout,
            poll_interval: config.poll_interval,
            session: None,
            buffered: Vec::new(),
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Translates the gateway's connect options into `rumqttc` options.
    fn mqtt_options(&self, options: &ConnectOptions) -> MqttOptions {
        let mut mqtt = MqttOptions::new(options.client_id.clone(), self.host.clone(), self.port);
        mqtt.set_keep_alive(options.keep_alive);
        // Commands are fire-and-forget; nothing to resume from a stored session.
        mqtt.set_clean_session(true);
        if let Some(credentials) = &options.credentials {
            mqtt.set_credentials(credentials.username.clone(), credentials.password.clone());
        }
        let will = &options.last_will;
        mqtt.set_last_will(rumqttc::LastWill::new(
            will.topic.clone(),
            will.payload.clone().into_bytes(),
            to_mqtt_qos(will.qos),
            will.retain,
        ));
        mqtt
    }

    fn session_mut(&mut self) -> Result<&mut Session, BusError> {
        self.session.as_mut().ok_or(BusError::NotConnected)
    }
}

#[async_trait]
impl MessageBus for MqttBus {
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), BusError> {
        self.session = None;
        self.buffered.clear();

        let addr = self.addr();
        let (client, mut eventloop) =
            AsyncClient::new(self.mqtt_options(options), REQUEST_CAPACITY);

        match time::timeout(self.connect_timeout, await_connack(&addr, &mut eventloop)).await {
            Ok(Ok(())) => {
                info!("connected to broker at {addr} as {}", options.client_id);
                self.session = Some(Session { client, eventloop });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BusError::Timeout(self.connect_timeout)),
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), BusError> {
        let session = self.session_mut()?;
        session
            .client
            .try_publish(topic, to_mqtt_qos(qos), retain, payload.to_vec())
            .map_err(|e| BusError::Request(e.to_string()))
    }

    async fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), BusError> {
        let ack_timeout = self.connect_timeout;
        let Some(session) = self.session.as_mut() else {
            return Err(BusError::NotConnected);
        };
        session
            .client
            .try_subscribe(topic, to_mqtt_qos(qos))
            .map_err(|e| BusError::Request(e.to_string()))?;

        let acked = time::timeout(
            ack_timeout,
            await_suback(topic, &mut session.eventloop, &mut self.buffered),
        )
        .await;

        let result = match acked {
            Ok(result) => result,
            Err(_) => Err(BusError::Timeout(ack_timeout)),
        };
        match result {
            Ok(()) => {
                debug!("subscribed to {topic}");
                Ok(())
            }
            Err(e) => {
                warn!("subscription to {topic} failed: {e}");
                self.session = None;
                Err(e)
            }
        }
    }

    async fn service_io(&mut self) -> Result<Vec<InboundMessage>, BusError> {
        let poll_interval = self.poll_interval;
        let Some(session) = self.session.as_mut() else {
            return Err(BusError::NotConnected);
        };

        let deadline = Instant::now() + poll_interval;
        let mut inbound = std::mem::take(&mut self.buffered);
        loop {
            match time::timeout_at(deadline, session.eventloop.poll()).await {
                Err(_) => break,
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    inbound.push(InboundMessage::new(publish.topic, publish.payload.to_vec()));
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("MQTT connection error: {e}");
                    self.session = None;
                    return Err(BusError::ConnectionLost(e.to_string()));
                }
            }
        }
        Ok(inbound)
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session
            .client
            .disconnect()
            .await
            .map_err(|e| BusError::Request(e.to_string()))?;

        // Flush queued requests (the final presence publish) ahead of the
        // DISCONNECT packet.
        let flush_timeout = self.connect_timeout;
        let flushed = time::timeout(flush_timeout, async {
            loop {
                match session.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                    Ok(_) => {}
                    Err(e) => return Err(BusError::ConnectionLost(e.to_string())),
                }
            }
        })
        .await;

        match flushed {
            Ok(result) => result,
            Err(_) => Err(BusError::Timeout(flush_timeout)),
        }
    }
}

/// Polls until the broker answers the pending subscribe.
async fn await_suback(
    topic: &str,
    eventloop: &mut EventLoop,
    buffered: &mut Vec<InboundMessage>,
) -> Result<(), BusError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                return if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    Err(BusError::Request(format!(
                        "broker refused subscription to {topic}"
                    )))
                } else {
                    Ok(())
                };
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                buffered.push(InboundMessage::new(publish.topic, publish.payload.to_vec()));
            }
            Ok(_) => {}
            Err(e) => return Err(BusError::ConnectionLost(e.to_string())),
        }
    }
}

/// Polls until the broker acknowledges the connect.
async fn await_connack(addr: &str, eventloop: &mut EventLoop) -> Result<(), BusError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(BusError::Refused(format!("{:?}", ack.code)))
                };
            }
            Ok(event) => debug!("pre-connack event: {event:?}"),
            Err(ConnectionError::ConnectionRefused(code)) => {
                return Err(BusError::Refused(format!("{code:?}")));
            }
            Err(e) => {
                return Err(BusError::ConnectFailed {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{LastWill, PresenceManager};
    use crate::domain::Credentials;
    use crate::infrastructure::clock::RecordingClock;
    use ir_gateway_core::ConnectionState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    // ── In-process broker ─────────────────────────────────────────────────────

    /// Reads one MQTT packet: the first header byte and the body.
    async fn read_packet(stream: &mut TcpStream) -> Option<(u8, Vec<u8>)> {
        let header = stream.read_u8().await.ok()?;
        let mut remaining = 0usize;
        let mut shift = 0;
        loop {
            let byte = stream.read_u8().await.ok()?;
            remaining |= usize::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0; remaining];
        stream.read_exact(&mut body).await.ok()?;
        Some((header, body))
    }

    /// Minimal MQTT 3.1.1 broker on an ephemeral port.  Accepts every
    /// connect, acknowledges QoS 1 publishes, and answers the SUBSCRIBE on
    /// the n-th connection with `suback_codes[n]`.
    async fn spawn_broker(suback_codes: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            for code in suback_codes {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    while let Some((header, body)) = read_packet(&mut stream).await {
                        let reply = match header >> 4 {
                            // CONNECT → CONNACK accepted
                            1 => vec![0x20, 0x02, 0x00, 0x00],
                            // PUBLISH with QoS > 0 → PUBACK
                            3 if header & 0x06 != 0 => {
                                let topic_len = usize::from(u16::from_be_bytes([body[0], body[1]]));
                                vec![0x40, 0x02, body[2 + topic_len], body[3 + topic_len]]
                            }
                            // SUBSCRIBE → SUBACK with the scripted code
                            8 => vec![0x90, 0x03, body[0], body[1], code],
                            // PINGREQ → PINGRESP
                            12 => vec![0xD0, 0x00],
                            // DISCONNECT
                            14 => break,
                            _ => continue,
                        };
                        if stream.write_all(&reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        port
    }

    fn local_config(port: u16) -> GatewayConfig {
        GatewayConfig {
            broker_port: port,
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    fn options() -> ConnectOptions {
        ConnectOptions {
            client_id: "IR-MQTT-Gateway".to_string(),
            credentials: Some(Credentials {
                username: "ir".to_string(),
                password: "secret".to_string(),
            }),
            keep_alive: Duration::from_secs(15),
            last_will: LastWill {
                topic: "home/ir/online".to_string(),
                payload: "false".to_string(),
                qos: QoS::AtLeastOnce,
                retain: true,
            },
        }
    }

    #[test]
    fn test_qos_mapping() {
        assert_eq!(to_mqtt_qos(QoS::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(to_mqtt_qos(QoS::AtLeastOnce), rumqttc::QoS::AtLeastOnce);
    }

    #[test]
    fn test_mqtt_options_carry_identity_credentials_and_last_will() {
        // Arrange
        let bus = MqttBus::new(&GatewayConfig::default());

        // Act
        let mqtt = bus.mqtt_options(&options());

        // Assert
        assert_eq!(mqtt.client_id(), "IR-MQTT-Gateway");
        assert_eq!(mqtt.broker_address(), ("127.0.0.1".to_string(), 1883));
        assert_eq!(mqtt.keep_alive(), Duration::from_secs(15));
        assert_eq!(
            mqtt.credentials(),
            Some(("ir".to_string(), "secret".to_string()))
        );
        let will = mqtt.last_will().unwrap();
        assert_eq!(&will.message[..], b"false");
        assert_eq!(will.qos, rumqttc::QoS::AtLeastOnce);
        assert!(will.retain);
    }

    #[tokio::test]
    async fn test_operations_without_session_report_not_connected() {
        let mut bus = MqttBus::new(&GatewayConfig::default());

        assert!(!bus.is_connected());
        assert!(matches!(
            bus.publish("home/ir", b"{}", QoS::AtMostOnce, false).await,
            Err(BusError::NotConnected)
        ));
        assert!(matches!(
            bus.subscribe("home/ir/command", QoS::AtMostOnce).await,
            Err(BusError::NotConnected)
        ));
        assert!(matches!(bus.service_io().await, Err(BusError::NotConnected)));
        assert!(bus.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails_without_session() {
        // Arrange: nothing listens on port 1
        let config = GatewayConfig {
            broker_port: 1,
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let mut bus = MqttBus::new(&config);

        // Act
        let result = bus.connect(&options()).await;

        // Assert
        assert!(matches!(
            result,
            Err(BusError::ConnectFailed { .. }) | Err(BusError::Timeout(_))
        ));
        assert!(!bus.is_connected());
    }

    #[tokio::test]
    async fn test_refused_subscription_fails_and_drops_session() {
        // Arrange: the broker answers SUBSCRIBE with 0x80 (failure)
        let port = spawn_broker(vec![0x80]).await;
        let mut bus = MqttBus::new(&local_config(port));
        bus.connect(&options()).await.unwrap();

        // Act
        let result = bus.subscribe("home/ir/command", QoS::AtMostOnce).await;

        // Assert
        assert!(matches!(result, Err(BusError::Request(_))), "{result:?}");
        assert!(!bus.is_connected());
    }

    #[tokio::test]
    async fn test_granted_subscription_keeps_session() {
        let port = spawn_broker(vec![0x00]).await;
        let mut bus = MqttBus::new(&local_config(port));
        bus.connect(&options()).await.unwrap();

        let result = bus.subscribe("home/ir/command", QoS::AtMostOnce).await;

        assert!(result.is_ok(), "{result:?}");
        assert!(bus.is_connected());
    }

    #[tokio::test]
    async fn test_presence_backs_off_and_retries_after_refused_subscription() {
        // Arrange: first connection refused at SUBSCRIBE, second granted
        let port = spawn_broker(vec![0x80, 0x00]).await;
        let config = local_config(port);
        let mut bus = MqttBus::new(&config);
        let mut presence = PresenceManager::new(&config);
        let clock = RecordingClock::new();

        // Act
        let backoffs = presence.ensure_connected(&mut bus, &clock).await;

        // Assert
        assert_eq!(backoffs, 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
        assert_eq!(presence.state(), ConnectionState::Connected);
        assert!(bus.is_connected());
    }
}
