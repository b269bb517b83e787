//! IR transceiver backends.
//!
//! - `dry_run` – logs commands instead of emitting them and never receives.
//!   The binary runs it when no hardware backend is configured.
//! - `mock` – scriptable recording transceiver for tests.

pub mod dry_run;
pub mod mock;

pub use dry_run::DryRunTransceiver;
