use jobq_core::api::{RetryConfig, RetryStrategyPlugin};
use jobq_core::executor::retry::max_attempts;
use std::time::Duration;

/// Doubles the cooldown after every transient failure, capped at `max_delay_ms`.
pub struct ExponentialBackoffPlugin {
    config: RetryConfig,
}

/// Grows the cooldown by `base_delay_ms` per attempt, capped at `max_delay_ms`.
pub struct LinearRetryPlugin {
    config: RetryConfig,
}

impl ExponentialBackoffPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetryPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

fn exhausted(config: &RetryConfig, attempt: u32) -> bool {
    max_attempts(config.max_attempts).is_some_and(|max| attempt >= max)
}

impl RetryStrategyPlugin for ExponentialBackoffPlugin {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if exhausted(&self.config, attempt) {
            return None;
        }
        let exp = 1u64 << attempt.saturating_sub(1).min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> Option<u32> {
        max_attempts(self.config.max_attempts)
    }
}

impl RetryStrategyPlugin for LinearRetryPlugin {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if exhausted(&self.config, attempt) {
            return None;
        }
        let multiplier = attempt.max(1) as u64;
        let delay = self.config.base_delay_ms.saturating_mul(multiplier);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> Option<u32> {
        max_attempts(self.config.max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let cfg = RetryConfig {
            base_delay_ms: 100,
            max_delay_ms: 1000,
            max_attempts: 4,
            strategy: "exponential-backoff".to_string(),
        };
        let plugin = ExponentialBackoffPlugin::new(cfg);
        assert_eq!(plugin.next_delay(1, "err").unwrap().as_millis(), 100);
        assert_eq!(plugin.next_delay(2, "err").unwrap().as_millis(), 200);
        assert_eq!(plugin.next_delay(3, "err").unwrap().as_millis(), 400);
        assert_eq!(plugin.next_delay(4, "err"), None);
        assert_eq!(plugin.max_attempts(), Some(4));
    }

    #[test]
    fn test_exponential_backoff_caps_delay() {
        let cfg = RetryConfig {
            base_delay_ms: 100,
            max_delay_ms: 1000,
            max_attempts: 0,
            strategy: "exponential-backoff".to_string(),
        };
        let plugin = ExponentialBackoffPlugin::new(cfg);
        assert_eq!(plugin.next_delay(40, "err").unwrap().as_millis(), 1000);
        assert_eq!(plugin.max_attempts(), None);
        assert!(plugin.should_retry(1_000, "err"));
    }

    #[test]
    fn test_linear_backoff() {
        let cfg = RetryConfig {
            base_delay_ms: 50,
            max_delay_ms: 200,
            max_attempts: 0,
            strategy: "linear".to_string(),
        };
        let plugin = LinearRetryPlugin::new(cfg);
        assert_eq!(plugin.next_delay(1, "err").unwrap().as_millis(), 50);
        assert_eq!(plugin.next_delay(3, "err").unwrap().as_millis(), 150);
        assert_eq!(plugin.next_delay(9, "err").unwrap().as_millis(), 200);
    }
}
