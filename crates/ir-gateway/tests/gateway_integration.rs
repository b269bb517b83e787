//! Integration tests for the gateway loop.
//!
//! These tests drive `Gateway` end-to-end through its public API with the
//! recording `MockBus`, `MockTransceiver` and `RecordingClock`, checking the
//! MQTT wire contract and the ordering guarantees between presence, commands
//! and IR events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;

use ir_gateway::application::{
    Clock, CommandOutcome, Gateway, InboundMessage, IrTransceiver, MessageBus, QoS,
    TransceiverError,
};
use ir_gateway::domain::GatewayConfig;
use ir_gateway::infrastructure::bus::mock::MockBus;
use ir_gateway::infrastructure::clock::RecordingClock;
use ir_gateway::infrastructure::transceiver::mock::{MockTransceiver, TransceiverCall};
use ir_gateway_core::{ConnectionState, IrFrame, Protocol};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config() -> GatewayConfig {
    GatewayConfig {
        base_topic: "ghs/livingroom/ir".to_string(),
        ..Default::default()
    }
}

fn gateway_with(bus: MockBus, clock: RecordingClock) -> Gateway<MockBus, MockTransceiver> {
    Gateway::new(&config(), bus, MockTransceiver::new(), Box::new(clock))
}

fn command(payload: &str) -> InboundMessage {
    InboundMessage::new("ghs/livingroom/ir/command", payload.as_bytes().to_vec())
}

// ── Command scenarios ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nec_command_is_transmitted_with_receiver_disabled() {
    // Arrange
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway.tick().await;
    gateway
        .bus_mut()
        .push_inbound(command(r#"{"protocol":"NEC","data":"20DF10EF","bitLength":32}"#));

    // Act
    let report = gateway.tick().await;

    // Assert
    assert_eq!(report.commands_sent, 1);
    let frame = IrFrame::new(Protocol::Nec, 0x20DF_10EF, 32);
    assert_eq!(
        gateway.transceiver().calls(),
        &[
            TransceiverCall::Disable,
            TransceiverCall::Send(frame),
            TransceiverCall::Enable,
        ]
    );
}

#[tokio::test]
async fn test_command_with_empty_data_is_dropped_and_loop_continues() {
    // Arrange
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway.tick().await;
    gateway
        .bus_mut()
        .push_inbound(command(r#"{"protocol":"NEC","data":"","bitLength":32}"#));
    gateway
        .bus_mut()
        .push_inbound(command(r#"{"protocol":"NEC","data":"20DF10EF","bitLength":32}"#));

    // Act
    let report = gateway.tick().await;

    // Assert: first rejected, second still handled
    assert_eq!(report.commands_rejected, 1);
    assert_eq!(report.commands_sent, 1);
    assert_eq!(gateway.transceiver().sent().len(), 1);
}

#[tokio::test]
async fn test_commands_missing_fields_never_reach_the_transceiver() {
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway.tick().await;
    for payload in [
        r#"{"data":"20DF10EF","bitLength":32}"#,
        r#"{"protocol":"NEC","bitLength":32}"#,
        r#"{"protocol":"NEC","data":"20DF10EF"}"#,
        r#"{"protocol":"NEC","data":"20DF10EF","bitLength":0}"#,
    ] {
        gateway.bus_mut().push_inbound(command(payload));
    }

    let report = gateway.tick().await;

    assert_eq!(report.commands_rejected, 4);
    assert!(gateway.transceiver().calls().is_empty());
}

#[tokio::test]
async fn test_unknown_protocol_is_forwarded_to_transceiver() {
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());

    let outcome = gateway.handle_command(&command(
        r#"{"protocol":"NOT_A_PROTOCOL","data":"1","bitLength":"8"}"#,
    ));

    assert!(matches!(
        outcome,
        CommandOutcome::Sent(IrFrame {
            protocol: Protocol::Unknown,
            ..
        })
    ));
}

// ── Event publishing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sony_frame_is_published_on_base_topic() {
    // Arrange
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway
        .transceiver_mut()
        .push_frame(IrFrame::new(Protocol::Sony, 0xA90, 12));

    // Act
    gateway.tick().await;

    // Assert
    let events = gateway.bus().published_on("ghs/livingroom/ir");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].payload,
        br#"{"protocol":"SONY","data":"A90","bitLength":"12"}"#
    );
    assert_eq!(events[0].qos, QoS::AtMostOnce);
    assert!(!events[0].retain);
}

#[tokio::test]
async fn test_events_are_published_in_decode_order() {
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    for value in [0x1, 0x2, 0x3] {
        gateway
            .transceiver_mut()
            .push_frame(IrFrame::new(Protocol::Nec, value, 32));
    }

    gateway.tick().await;

    let datas: Vec<String> = gateway
        .bus()
        .published_on("ghs/livingroom/ir")
        .iter()
        .map(|m| String::from_utf8_lossy(&m.payload).into_owned())
        .collect();
    assert_eq!(datas.len(), 3);
    assert!(datas[0].contains(r#""data":"1""#));
    assert!(datas[1].contains(r#""data":"2""#));
    assert!(datas[2].contains(r#""data":"3""#));
}

// ── Presence ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_publishes_online_retained_with_offline_last_will() {
    // Arrange
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());

    // Act
    gateway.tick().await;

    // Assert
    let online = gateway.bus().published_on("ghs/livingroom/ir/online");
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].payload, b"true");
    assert!(online[0].retain);
    assert_eq!(online[0].qos, QoS::AtLeastOnce);

    let will = gateway.bus().last_will().unwrap();
    assert_eq!(will.topic, "ghs/livingroom/ir/online");
    assert_eq!(will.payload, "false");
    assert!(will.retain);
    assert_eq!(will.qos, QoS::AtLeastOnce);
}

#[tokio::test]
async fn test_online_presence_precedes_first_event() {
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway
        .transceiver_mut()
        .push_frame(IrFrame::new(Protocol::Nec, 0x20DF_10EF, 32));

    gateway.tick().await;

    let topics: Vec<&str> = gateway
        .bus()
        .published
        .iter()
        .map(|m| m.topic.as_str())
        .collect();
    assert_eq!(topics, vec!["ghs/livingroom/ir/online", "ghs/livingroom/ir"]);
}

#[tokio::test]
async fn test_transport_loss_reconnects_and_republishes_presence() {
    // Arrange
    let clock = RecordingClock::new();
    let mut gateway = gateway_with(MockBus::new(), clock.clone());
    gateway.tick().await;

    // Act
    gateway.bus_mut().drop_connection();
    gateway.tick().await;

    // Assert
    assert_eq!(gateway.presence().state(), ConnectionState::Connected);
    assert_eq!(gateway.bus().connects.len(), 2);
    let online = gateway.bus().published_on("ghs/livingroom/ir/online");
    assert!(online.iter().all(|m| m.payload == b"true"));
    assert_eq!(online.len(), 2);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_shutdown_announces_offline() {
    let mut gateway = gateway_with(MockBus::new(), RecordingClock::new());
    gateway.tick().await;

    gateway.shutdown().await;

    let online = gateway.bus().published_on("ghs/livingroom/ir/online");
    assert_eq!(online.last().unwrap().payload, b"false");
    assert!(!gateway.bus().is_connected());
}

// ── Backoff liveness ──────────────────────────────────────────────────────────

/// Shared record of what happened, in order, across clock and transceiver.
type Timeline = Arc<Mutex<Vec<&'static str>>>;

struct TimelineClock(Timeline);

#[async_trait]
impl Clock for TimelineClock {
    async fn sleep(&self, _duration: Duration) {
        self.0.lock().unwrap().push("sleep");
    }
}

struct TimelineTransceiver {
    timeline: Timeline,
    inner: MockTransceiver,
}

impl IrTransceiver for TimelineTransceiver {
    fn try_receive(&mut self) -> Option<IrFrame> {
        let frame = self.inner.try_receive();
        if frame.is_some() {
            self.timeline.lock().unwrap().push("receive");
        }
        frame
    }
    fn resume(&mut self) {
        self.inner.resume();
    }
    fn disable(&mut self) {
        self.inner.disable();
    }
    fn enable(&mut self) {
        self.inner.enable();
    }
    fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError> {
        self.timeline.lock().unwrap().push("send");
        self.inner.send(frame)
    }
}

#[tokio::test]
async fn test_k_failed_connects_take_exactly_k_backoffs_before_any_processing() {
    // Arrange: three refusals, a pending IR frame and a pending command
    let timeline: Timeline = Arc::default();
    let mut bus = MockBus::new();
    bus.fail_next_connects(3);
    bus.push_inbound(command(r#"{"protocol":"NEC","data":"20DF10EF","bitLength":32}"#));
    let mut inner = MockTransceiver::new();
    inner.push_frame(IrFrame::new(Protocol::Sony, 0xA90, 12));
    let transceiver = TimelineTransceiver {
        timeline: Arc::clone(&timeline),
        inner,
    };
    let mut gateway = Gateway::new(
        &config(),
        bus,
        transceiver,
        Box::new(TimelineClock(Arc::clone(&timeline))),
    );

    // Act
    let report = gateway.tick().await;

    // Assert
    assert_eq!(report.backoffs, 3);
    assert_eq!(gateway.presence().state(), ConnectionState::Connected);
    assert_eq!(gateway.bus().connects.len(), 4);
    assert_eq!(
        *timeline.lock().unwrap(),
        vec!["sleep", "sleep", "sleep", "send", "receive"]
    );
}

#[tokio::test]
async fn test_backoff_waits_are_the_fixed_five_seconds() {
    let clock = RecordingClock::new();
    let mut bus = MockBus::new();
    bus.fail_next_connects(2);
    let mut gateway = gateway_with(bus, clock.clone());

    gateway.tick().await;

    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5); 2]);
}

// ── Interaction-forbidding transceiver ────────────────────────────────────────

mock! {
    Radio {}

    impl IrTransceiver for Radio {
        fn try_receive(&mut self) -> Option<IrFrame>;
        fn resume(&mut self);
        fn disable(&mut self);
        fn enable(&mut self);
        fn send(&mut self, frame: &IrFrame) -> Result<(), TransceiverError>;
    }
}

#[tokio::test]
async fn test_malformed_command_never_touches_the_radio() {
    // Arrange: any transmit-side call fails the test
    let mut radio = MockRadio::new();
    radio.expect_disable().never();
    radio.expect_enable().never();
    radio.expect_send().never();
    radio.expect_try_receive().returning(|| None);
    let mut bus = MockBus::new();
    bus.push_inbound(command(r#"{"protocol":"NEC","data":"","bitLength":32}"#));
    let mut gateway = Gateway::new(&config(), bus, radio, Box::new(RecordingClock::new()));

    // Act
    let report = gateway.tick().await;

    // Assert
    assert_eq!(report.commands_rejected, 1);
}
