//! [`MessageBus`](crate::application::MessageBus) adapters.
//!
//! - `mqtt` – `MqttBus`, the production adapter over `rumqttc`.
//! - `mock` – `MockBus`, an in-memory recording bus for tests.

pub mod mock;
pub mod mqtt;

pub use mqtt::MqttBus;
