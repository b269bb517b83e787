//! [`Clock`] implementations.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::Clock;

/// Real time, via `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and records every requested sleep.
///
/// Clones share the same record, so a test can keep one handle while the
/// gateway owns another.
#[derive(Debug, Default, Clone)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to [`Clock::sleep`] so far, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        match self.sleeps.lock() {
            Ok(sleeps) => sleeps.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        match self.sleeps.lock() {
            Ok(mut sleeps) => sleeps.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_clock_clones_share_history() {
        // Arrange
        let clock = RecordingClock::new();
        let handle = clock.clone();

        // Act
        clock.sleep(Duration::from_secs(5)).await;
        clock.sleep(Duration::from_secs(5)).await;

        // Assert
        assert_eq!(handle.sleeps(), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test]
    async fn test_tokio_clock_sleeps_at_least_the_requested_duration() {
        let start = tokio::time::Instant::now();

        TokioClock.sleep(Duration::from_millis(20)).await;

        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
