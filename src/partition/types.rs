//! Partition types and traits
//!
//! Defines the partition key, the on-disk target it resolves to, and the
//! transform seam the ingestion orchestrator applies before partitioning.

use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// File name prefix shared by every partition file
pub const PARTITION_FILE_PREFIX: &str = "trip_data";

/// Partition file extension
pub const PARTITION_FILE_EXTENSION: &str = "parquet";

static PARTITION_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^trip_data_(?:(\d{1,5})_(\d{1,2})|(unparsed))\.parquet$")
        .expect("partition file pattern is valid")
});

/// A (year, month) pair identifying one monthly partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    year: u16,
    month: u8,
}

impl PartitionKey {
    /// Create a key, rejecting months outside 1..=12 and year zero
    pub fn new(year: u16, month: u8) -> Result<Self> {
        if year == 0 {
            return Err(Error::invalid_value("year", "must be positive"));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_value(
                "month",
                format!("{month} is not in 1..=12"),
            ));
        }
        Ok(Self { year, month })
    }

    /// Partition year
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Partition month, 1..=12
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Where a slice of rows is appended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionTarget {
    /// The monthly partition for a key
    Month(PartitionKey),
    /// Sentinel partition for rows whose key could not be derived
    Unparsed,
}

impl PartitionTarget {
    /// Target for a (year, month) pair
    pub fn month(year: u16, month: u8) -> Result<Self> {
        PartitionKey::new(year, month).map(Self::Month)
    }

    /// File name of the partition, e.g. `trip_data_2024_1.parquet`
    pub fn file_name(&self) -> String {
        match self {
            Self::Month(key) => format!(
                "{PARTITION_FILE_PREFIX}_{}_{}.{PARTITION_FILE_EXTENSION}",
                key.year, key.month
            ),
            Self::Unparsed => {
                format!("{PARTITION_FILE_PREFIX}_unparsed.{PARTITION_FILE_EXTENSION}")
            }
        }
    }

    /// Full path of the partition under `dir`
    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }

    /// Recover a target from a partition file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = PARTITION_FILE_RE.captures(name)?;
        if caps.get(3).is_some() {
            return Some(Self::Unparsed);
        }
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        Self::month(year, month).ok()
    }

    /// The key of a monthly target
    pub fn key(&self) -> Option<PartitionKey> {
        match self {
            Self::Month(key) => Some(*key),
            Self::Unparsed => None,
        }
    }
}

impl From<PartitionKey> for PartitionTarget {
    fn from(key: PartitionKey) -> Self {
        Self::Month(key)
    }
}

impl std::fmt::Display for PartitionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month(key) => write!(f, "{key}"),
            Self::Unparsed => write!(f, "unparsed"),
        }
    }
}

/// A step applied to an aligned batch before it is partitioned
pub trait BatchTransform {
    /// Transform the batch. Must not depend on state outside `self`.
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch>;

    /// Short name for logs
    fn name(&self) -> &str {
        "transform"
    }
}

impl<F> BatchTransform for F
where
    F: Fn(RecordBatch) -> Result<RecordBatch>,
{
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self(batch)
    }
}
