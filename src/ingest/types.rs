//! Ingestion report types

use crate::error::Error;
use crate::partition::{AppendOutcome, PartitionTarget};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of appending one partition slice
#[derive(Debug)]
pub struct PartitionResult {
    /// Partition the slice was routed to
    pub target: PartitionTarget,
    /// Rows in the slice
    pub rows: usize,
    /// Append outcome or the error that aborted this partition
    pub outcome: std::result::Result<AppendOutcome, Error>,
}

impl PartitionResult {
    /// Whether the append succeeded
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Completion status of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every partition append succeeded
    Ok,
    /// Some partition appends failed
    Partial,
    /// The batch failed as a whole, or every append failed
    Failed,
}

impl BatchStatus {
    /// Lowercase name written to the run log
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report for one ingested batch file
#[derive(Debug)]
pub struct IngestReport {
    /// Batch file path
    pub batch: PathBuf,
    /// Rows in the batch
    pub rows: usize,
    /// One entry per partition the batch touched, in processing order
    pub partitions: Vec<PartitionResult>,
    /// Wall-clock duration of the ingest
    pub duration: Duration,
}

impl IngestReport {
    /// Status derived from the partition results
    pub fn status(&self) -> BatchStatus {
        let failed = self.failed_partitions().count();
        if failed == 0 {
            BatchStatus::Ok
        } else if failed == self.partitions.len() {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        }
    }

    /// Partition results that failed
    pub fn failed_partitions(&self) -> impl Iterator<Item = &PartitionResult> {
        self.partitions.iter().filter(|p| !p.is_ok())
    }

    /// Rows successfully appended across all partitions
    pub fn rows_written(&self) -> usize {
        self.partitions
            .iter()
            .filter_map(|p| p.outcome.as_ref().ok())
            .map(|o| o.rows_appended)
            .sum()
    }
}

/// Summary of a multi-batch run
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Reports of batches that were processed (possibly with partial failures)
    pub succeeded: Vec<IngestReport>,
    /// Batches that failed as a whole
    pub failed: Vec<(PathBuf, Error)>,
}

impl IngestSummary {
    /// Total rows appended across all batches
    pub fn rows_written(&self) -> usize {
        self.succeeded.iter().map(IngestReport::rows_written).sum()
    }

    /// Whether every batch and every partition append succeeded
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.succeeded.iter().all(|r| r.status() == BatchStatus::Ok)
    }
}
