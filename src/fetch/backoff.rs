//! Randomized retry backoff

use crate::types::SleepRange;
use std::time::Duration;

/// Attempts after which the long range applies
pub const DEFAULT_LONG_RETRY_AFTER: u32 = 10;

/// Sleep policy between failed attempts on one page.
///
/// Attempts `1..=long_after` draw from the short range, later attempts
/// from the long range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryBackoff {
    short: SleepRange,
    long: SleepRange,
    long_after: u32,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            short: SleepRange::from_static(5.0, 15.0),
            long: SleepRange::from_static(30.0, 60.0),
            long_after: DEFAULT_LONG_RETRY_AFTER,
        }
    }
}

impl RetryBackoff {
    /// Create a backoff policy
    pub fn new(short: SleepRange, long: SleepRange, long_after: u32) -> Self {
        Self {
            short,
            long,
            long_after,
        }
    }

    /// A policy that never sleeps
    pub fn none() -> Self {
        Self::new(SleepRange::zero(), SleepRange::zero(), DEFAULT_LONG_RETRY_AFTER)
    }

    /// Range used after the given one-based failed attempt
    pub fn range_for(&self, attempt: u32) -> SleepRange {
        if attempt > self.long_after {
            self.long
        } else {
            self.short
        }
    }

    /// Sleep duration after the given one-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.range_for(attempt).sample()
    }
}
