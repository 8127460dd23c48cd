//! Post-create settle handling
//!
//! VSTS acknowledges project creation before the project shows up in any
//! listing. The controller waits out a fixed delay and then checks once.

use std::time::Duration;

/// Delay before the first post-create lookup
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(30);

/// How long to wait, and how many times to look, after a create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleStrategy {
    pub delay: Duration,
    /// Lookups attempted, each preceded by `delay`
    pub attempts: u32,
}

impl SettleStrategy {
    pub fn new(delay: Duration, attempts: u32) -> Self {
        Self {
            delay,
            attempts: attempts.max(1),
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, 1)
    }

    /// Upper bound of time spent sleeping
    pub fn total_wait(&self) -> Duration {
        self.delay.checked_mul(self.attempts).unwrap_or(Duration::MAX)
    }
}

impl Default for SettleStrategy {
    fn default() -> Self {
        Self::fixed(DEFAULT_SETTLE_DELAY)
    }
}
