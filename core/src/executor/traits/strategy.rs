use std::time::Duration;

/// Retry policy for transient failures.
pub trait RetryStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Cooldown before the task is re-queued, given the attempts made so far.
    /// `None` gives up.
    fn next_delay(&self, attempt: u32, error: &str) -> Option<Duration>;

    /// Total attempts allowed per task; `None` retries forever.
    fn max_attempts(&self) -> Option<u32>;

    fn should_retry(&self, attempt: u32, error: &str) -> bool {
        self.max_attempts().map_or(true, |max| attempt < max) && !self.is_fatal_error(error)
    }

    fn is_fatal_error(&self, _error: &str) -> bool {
        false
    }
}
