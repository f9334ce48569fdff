// src/rate.rs
// Rate Governor: a minimum interval between outbound requests from a single
// retrieval actor. The wait blocks the calling task; it is not a fairness
// guarantee across callers.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateGovernor {
    min_interval: Duration,
    // Held across the sleep so concurrent callers serialize behind it.
    last: Mutex<Option<Instant>>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Complete no sooner than `min_interval` after the previous completion.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_interval_does_not_sleep() {
        let governor = RateGovernor::from_millis(0);
        let start = Instant::now();
        governor.wait().await;
        governor.wait().await;
        governor.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn consecutive_waits_are_spaced() {
        let governor = RateGovernor::from_millis(30);
        governor.wait().await;
        let t0 = Instant::now();
        governor.wait().await;
        // Small scheduler slack below the configured interval.
        assert!(t0.elapsed() >= Duration::from_millis(25));
    }
}
