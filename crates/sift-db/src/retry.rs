//! Busy/locked retry logic.
//!
//! A second process (or a long-running CLI command) holding the write lock
//! surfaces as `SQLITE_BUSY` / "database is locked". Those errors are retried
//! with capped exponential backoff; anything else propagates immediately.

use std::time::Duration;

/// Configuration for retry behavior on busy/locked errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Detect lock contention errors.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL or
/// constraint errors.
pub fn is_busy_error(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("SQLITE_BUSY")
        || msg.contains("SQLITE_LOCKED")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(800));
        assert_eq!(config.delay_for(10), Duration::from_secs(2));
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(RetryConfig::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn constraint_errors_are_not_busy() {
        let err = libsql::Error::SqliteFailure(19, "UNIQUE constraint failed".into());
        assert!(!is_busy_error(&err));
        let busy = libsql::Error::SqliteFailure(5, "database is locked".into());
        assert!(is_busy_error(&busy));
    }
}
