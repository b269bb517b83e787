//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file, fills in
//! defaults for anything missing (including the whole file on first run),
//! and validates the result into the runtime
//! [`GatewayConfig`](crate::domain::GatewayConfig).

pub mod config;
