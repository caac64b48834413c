use std::time::Duration;

use super::traits::RetryStrategyPlugin;

/// Cooldown between a transient failure and the next attempt.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Maps the configured attempt limit to a strategy limit; 0 means unbounded.
pub fn max_attempts(configured: u32) -> Option<u32> {
    (configured > 0).then_some(configured)
}

/// Same cooldown after every transient failure.
#[derive(Debug, Clone, Copy)]
pub struct FixedCooldown {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedCooldown {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub fn unbounded(delay: Duration) -> Self {
        Self::new(delay, None)
    }
}

impl Default for FixedCooldown {
    fn default() -> Self {
        Self::unbounded(DEFAULT_COOLDOWN)
    }
}

impl RetryStrategyPlugin for FixedCooldown {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }
        Some(self.delay)
    }

    fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(max_attempts(0), None);
        assert_eq!(max_attempts(3), Some(3));
    }

    #[test]
    fn fixed_cooldown_respects_limit() {
        let unbounded = FixedCooldown::default();
        assert_eq!(unbounded.next_delay(10_000, "err"), Some(DEFAULT_COOLDOWN));
        assert!(unbounded.should_retry(10_000, "err"));

        let capped = FixedCooldown::new(Duration::from_millis(10), Some(2));
        assert_eq!(capped.next_delay(1, "err"), Some(Duration::from_millis(10)));
        assert!(capped.should_retry(1, "err"));
        assert_eq!(capped.next_delay(2, "err"), None);
        assert!(!capped.should_retry(2, "err"));
    }
}
