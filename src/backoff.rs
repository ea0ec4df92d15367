use std::time::Duration;

use tracing::{info, warn};

/// Exponential backoff between prediction attempts: `base * 2^(attempt - 1)`, capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_interval: Duration,
    max_interval: Duration,
    current_attempt: u32,
    current_interval: Duration,
}

impl ExponentialBackoff {
    pub fn new(base_interval: Duration, max_interval: Duration) -> Self {
        ExponentialBackoff {
            base_interval,
            max_interval,
            current_attempt: 0,
            current_interval: base_interval,
        }
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn on_failure(&mut self, error_message: &str) -> Duration {
        self.current_attempt += 1;

        let factor = 2_u32.saturating_pow(self.current_attempt.saturating_sub(1));
        let next = self.base_interval.saturating_mul(factor);
        self.current_interval = next.min(self.max_interval);

        warn!(
            attempt = self.current_attempt,
            interval_ms = self.current_interval.as_millis() as u64,
            error = error_message,
            "prediction attempt failed"
        );

        self.current_interval
    }

    pub fn on_success(&mut self) {
        if self.current_attempt > 0 {
            info!(attempts = self.current_attempt, "prediction service recovered");
        }
        self.current_attempt = 0;
        self.current_interval = self.base_interval;
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    #[cfg(test)]
    fn interval(&self) -> Duration {
        self.current_interval
    }

    pub fn should_give_up(&self, max_total_attempts: u32) -> bool {
        self.current_attempt >= max_total_attempts
    }
}
