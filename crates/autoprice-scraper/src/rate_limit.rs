//! Pacing between consecutive trims of a batch.
//!
//! Batches are deliberately sequential: one trim's searches finish, then the
//! pacer waits a fixed interval before the next trim starts. This caps the
//! request rate seen by the external sites regardless of how fast they answer.

use std::time::Duration;

/// Fixed inter-trim delay.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits out the interval. A zero interval returns immediately.
    pub async fn pause(&self) {
        if self.interval.is_zero() {
            return;
        }
        tracing::debug!(
            delay_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "pacing before next trim"
        );
        tokio::time::sleep(self.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn zero_interval_does_not_sleep() {
        let pacer = Pacer::new(Duration::ZERO);
        let started = Instant::now();
        pacer.pause().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn pause_waits_at_least_the_interval() {
        let pacer = Pacer::new(Duration::from_millis(40));
        let started = Instant::now();
        pacer.pause().await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
