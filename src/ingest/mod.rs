//! Ingestion module
//!
//! Turns raw page files into partition appends.
//!
//! # Overview
//!
//! For every batch file the ingestor:
//! - loads the JSON array into a RecordBatch
//! - aligns it to the canonical schema
//! - applies the optional transform (normally the temporal partitioner)
//! - appends each partition's rows to its Parquet file
//! - records a line in the run log
//!
//! Partition appends are independent: one failing partition does not roll
//! back or stop the others.

mod types;

pub use types::{BatchStatus, IngestReport, IngestSummary, PartitionResult};

use crate::error::Result;
use crate::partition::{
    key_mask, partition_keys, unparsed_mask, BatchTransform, PartitionStore, PartitionTarget,
};
use crate::run_log::RunLog;
use crate::schema::{align, dropped_columns, CanonicalSchema};
use crate::storage::read_json_batch;
use crate::types::page_file_name;
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Ingestion orchestrator
pub struct Ingestor {
    schema: CanonicalSchema,
    store: PartitionStore,
    run_log: Option<RunLog>,
}

impl Ingestor {
    /// Create an ingestor writing into `store`
    pub fn new(schema: CanonicalSchema, store: PartitionStore) -> Self {
        Self {
            schema,
            store,
            run_log: None,
        }
    }

    /// Record one line per batch in `run_log`
    #[must_use]
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    /// Get the canonical schema
    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    /// Get the partition store
    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    /// Ingest one batch file.
    ///
    /// Unreadable input or an unreconcilable column type fails the whole
    /// batch. Partition append failures are reported per partition.
    pub fn ingest(
        &self,
        path: impl AsRef<Path>,
        transform: Option<&dyn BatchTransform>,
    ) -> Result<IngestReport> {
        let path = path.as_ref();
        let start = Instant::now();

        let routed = self.prepare(path, transform).and_then(|batch| {
            let partitions = self.route(&batch)?;
            Ok((batch.num_rows(), partitions))
        });
        let (rows, partitions) = match routed {
            Ok(routed) => routed,
            Err(e) => {
                error!("Failed to ingest {}: {e}", path.display());
                self.log_batch(path, start, BatchStatus::Failed.as_str());
                return Err(e);
            }
        };

        let report = IngestReport {
            batch: path.to_path_buf(),
            rows,
            partitions,
            duration: start.elapsed(),
        };

        let status = report.status();
        self.log_batch(path, start, status.as_str());
        info!(
            rows = report.rows,
            partitions = report.partitions.len(),
            %status,
            "Processed file: {} in {:.2}s",
            path.display(),
            report.duration.as_secs_f64()
        );

        Ok(report)
    }

    /// Ingest batches strictly in the given order, continuing past failures
    pub fn ingest_all<P: AsRef<Path>>(
        &self,
        paths: impl IntoIterator<Item = P>,
        transform: Option<&dyn BatchTransform>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for path in paths {
            let path = path.as_ref();
            match self.ingest(path, transform) {
                Ok(report) => summary.succeeded.push(report),
                Err(e) => summary.failed.push((path.to_path_buf(), e)),
            }
        }
        summary
    }

    /// Load, align and transform a batch
    fn prepare(&self, path: &Path, transform: Option<&dyn BatchTransform>) -> Result<RecordBatch> {
        let raw = read_json_batch(path)?;

        let dropped = dropped_columns(&raw, &self.schema);
        if !dropped.is_empty() {
            debug!(?dropped, "Dropping non-canonical columns from {}", path.display());
        }

        let aligned = align(&raw, &self.schema)?;

        match transform {
            Some(transform) => {
                debug!(transform = transform.name(), "Applying transform");
                transform.apply(aligned)
            }
            None => Ok(aligned),
        }
    }

    /// Split a prepared batch by partition and append every slice
    fn route(&self, batch: &RecordBatch) -> Result<Vec<PartitionResult>> {
        let mut slices: Vec<(PartitionTarget, RecordBatch)> = Vec::new();

        for key in partition_keys(batch, &self.schema)? {
            let mask = key_mask(batch, &self.schema, key)?;
            slices.push((key.into(), filter_record_batch(batch, &mask)?));
        }

        let unparsed = unparsed_mask(batch, &self.schema)?;
        if unparsed.true_count() > 0 {
            warn!(
                rows = unparsed.true_count(),
                "Routing rows without a partition key to the unparsed partition"
            );
            slices.push((
                PartitionTarget::Unparsed,
                filter_record_batch(batch, &unparsed)?,
            ));
        }

        let results = slices
            .into_iter()
            .map(|(target, slice)| {
                let outcome = self.store.append(&slice, target);
                if let Err(e) = &outcome {
                    error!(partition = %target, "Partition append failed: {e}");
                }
                PartitionResult {
                    target,
                    rows: slice.num_rows(),
                    outcome,
                }
            })
            .collect();

        Ok(results)
    }

    fn log_batch(&self, path: &Path, start: Instant, status: &str) {
        if let Some(run_log) = &self.run_log {
            if let Err(e) = run_log.record_batch(path, start.elapsed(), status) {
                warn!("Failed to write run log {}: {e}", run_log.path().display());
            }
        }
    }
}

/// Raw page files for the inclusive one-based page range, ascending.
///
/// Missing pages are skipped with a warning.
pub fn batch_paths(dir: impl AsRef<Path>, first_page: u64, last_page: u64) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for page in first_page..=last_page {
        let path = dir.join(page_file_name(page));
        if path.is_file() {
            paths.push(path);
        } else {
            warn!("Batch file not found, skipping: {}", path.display());
        }
    }
    paths
}

#[cfg(test)]
mod tests;
