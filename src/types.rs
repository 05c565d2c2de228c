//! Common types used throughout the pipeline
//!
//! Shared constants and small value types used by more than one module.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Raw Page Files
// ============================================================================

/// File name prefix of raw page files
pub const PAGE_FILE_PREFIX: &str = "trip_data_page_";

/// Digits a page number is padded to in raw page file names
pub const PAGE_NUMBER_WIDTH: usize = 5;

/// Raw page file name for a one-based page number, e.g. `trip_data_page_00001.json`
pub fn page_file_name(page: u64) -> String {
    format!("{PAGE_FILE_PREFIX}{page:0width$}.json", width = PAGE_NUMBER_WIDTH)
}

// ============================================================================
// Sleep Range
// ============================================================================

/// An inclusive range of seconds a randomized sleep is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct SleepRange {
    min: f64,
    max: f64,
}

impl SleepRange {
    /// Create a range, rejecting negative or inverted bounds
    pub fn new(min: f64, max: f64) -> crate::Result<Self> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(crate::Error::invalid_value(
                "sleep range",
                format!("bounds must be finite and non-negative, got [{min}, {max}]"),
            ));
        }
        if min > max {
            return Err(crate::Error::invalid_value(
                "sleep range",
                format!("min {min} is greater than max {max}"),
            ));
        }
        Ok(Self { min, max })
    }

    /// A range that always yields zero
    pub const fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Range from bounds known to be valid at compile time
    pub(crate) const fn from_static(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Lower bound in seconds
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound in seconds
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Draw a uniformly distributed duration from the range
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return Duration::from_secs_f64(self.min);
        }
        let secs = rand::rng().random_range(self.min..=self.max);
        Duration::from_secs_f64(secs)
    }
}

impl TryFrom<[f64; 2]> for SleepRange {
    type Error = crate::Error;

    fn try_from(value: [f64; 2]) -> crate::Result<Self> {
        Self::new(value[0], value[1])
    }
}

impl From<SleepRange> for [f64; 2] {
    fn from(range: SleepRange) -> Self {
        [range.min, range.max]
    }
}

impl std::fmt::Display for SleepRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s-{}s", self.min, self.max)
    }
}

// ============================================================================
// Log Level
// ============================================================================

/// Log level accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_name_is_padded() {
        assert_eq!(page_file_name(1), "trip_data_page_00001.json");
        assert_eq!(page_file_name(12345), "trip_data_page_12345.json");
        assert_eq!(page_file_name(123456), "trip_data_page_123456.json");
    }

    #[test]
    fn test_sleep_range_sample_within_bounds() {
        let range = SleepRange::new(0.01, 0.05).unwrap();
        for _ in 0..100 {
            let d = range.sample();
            assert!(d >= Duration::from_secs_f64(0.01));
            assert!(d <= Duration::from_secs_f64(0.05));
        }
    }

    #[test]
    fn test_sleep_range_zero_width() {
        let range = SleepRange::new(2.0, 2.0).unwrap();
        assert_eq!(range.sample(), Duration::from_secs(2));
        assert_eq!(SleepRange::zero().sample(), Duration::ZERO);
    }

    #[test]
    fn test_sleep_range_rejects_inverted() {
        assert!(SleepRange::new(10.0, 5.0).is_err());
        assert!(SleepRange::new(-1.0, 5.0).is_err());
    }

    #[test]
    fn test_sleep_range_serde() {
        let range: SleepRange = serde_json::from_str("[7, 20]").unwrap();
        assert_eq!(range.min(), 7.0);
        assert_eq!(range.max(), 20.0);
        assert!(serde_json::from_str::<SleepRange>("[20, 7]").is_err());
        assert_eq!(serde_json::to_string(&range).unwrap(), "[7.0,20.0]");
    }

    #[test]
    fn test_log_level_conversion() {
        let level: tracing::Level = LogLevel::Warn.into();
        assert_eq!(level, tracing::Level::WARN);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}
