//! Partition file store
//!
//! One Parquet file per partition under a single directory. Appending to
//! an existing partition reads it in full, concatenates the new rows with
//! a union of columns, and atomically replaces the file.

use super::types::PartitionTarget;
use crate::error::{Error, Result};
use crate::storage::{
    concat_diagonal, parquet_row_count, read_parquet, write_parquet_atomic,
    ParquetWriterConfig,
};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of one append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Partition file written
    pub path: PathBuf,
    /// Rows in the partition before the append (0 when created)
    pub rows_before: usize,
    /// Rows contributed by the slice
    pub rows_appended: usize,
    /// Rows in the partition after the append
    pub rows_after: usize,
    /// Whether the partition file was created by this append
    pub created: bool,
}

/// Directory of partition files
#[derive(Debug, Clone)]
pub struct PartitionStore {
    dir: PathBuf,
    writer_config: ParquetWriterConfig,
}

impl PartitionStore {
    /// Create a store rooted at `dir` with default writer settings
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writer_config: ParquetWriterConfig::default(),
        }
    }

    /// Set the Parquet writer settings
    #[must_use]
    pub fn with_writer_config(mut self, config: ParquetWriterConfig) -> Self {
        self.writer_config = config;
        self
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `target`
    pub fn partition_path(&self, target: PartitionTarget) -> PathBuf {
        target.path_in(&self.dir)
    }

    /// Partition targets currently on disk, sorted (unparsed last)
    pub fn list_partitions(&self) -> Result<Vec<PartitionTarget>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut targets = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(target) = entry
                .file_name()
                .to_str()
                .and_then(PartitionTarget::from_file_name)
            {
                targets.push(target);
            }
        }

        targets.sort_by_key(|t| match t {
            PartitionTarget::Month(key) => (0, Some(*key)),
            PartitionTarget::Unparsed => (1, None),
        });
        Ok(targets)
    }

    /// Read a partition in full
    pub fn read(&self, target: PartitionTarget) -> Result<RecordBatch> {
        let path = self.partition_path(target);
        read_parquet(&path).map_err(|e| match e {
            Error::FileNotFound { .. } => e,
            other => Error::partition_corrupt(&path, other.to_string()),
        })
    }

    /// Append a slice of rows to a partition.
    ///
    /// An absent partition is created with exactly the slice's rows and only
    /// appears under its final name once it decodes with that count. A
    /// present one is replaced by `existing ++ slice` with the union of
    /// both column sets. An empty slice changes nothing.
    pub fn append(&self, slice: &RecordBatch, target: PartitionTarget) -> Result<AppendOutcome> {
        let path = self.partition_path(target);
        let rows_appended = slice.num_rows();

        if rows_appended == 0 {
            debug!(partition = %target, "Empty slice, nothing to append");
            let rows_before = if path.exists() {
                parquet_row_count(&path)
                    .map_err(|e| Error::partition_corrupt(&path, e.to_string()))?
            } else {
                0
            };
            return Ok(AppendOutcome {
                path,
                rows_before,
                rows_appended: 0,
                rows_after: rows_before,
                created: false,
            });
        }

        std::fs::create_dir_all(&self.dir)?;

        if !path.exists() {
            write_parquet_atomic(&path, slice, Some(&self.writer_config))?;

            info!(
                partition = %target,
                rows = rows_appended,
                "Created partition {}",
                path.display()
            );
            return Ok(AppendOutcome {
                path,
                rows_before: 0,
                rows_appended,
                rows_after: rows_appended,
                created: true,
            });
        }

        let existing = self.read(target)?;
        let rows_before = existing.num_rows();
        let combined = concat_diagonal(&[existing, slice.clone()])?;
        let rows_after = write_parquet_atomic(&path, &combined, Some(&self.writer_config))?;

        info!(
            partition = %target,
            rows_before,
            rows_appended,
            rows_after,
            "Appended to partition {}",
            path.display()
        );
        Ok(AppendOutcome {
            path,
            rows_before,
            rows_appended,
            rows_after,
            created: false,
        })
    }
}
