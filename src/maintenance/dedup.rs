//! Key-based deduplication

use crate::error::{Error, Result};
use crate::storage::{read_parquet, write_parquet_atomic, ParquetWriterConfig};
use arrow::array::UInt32Array;
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Row counts around a file deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    /// Rows before
    pub rows_before: usize,
    /// Rows after
    pub rows_after: usize,
}

impl DedupReport {
    /// Rows removed
    pub fn removed(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// Keep the first row of every distinct `key` value, in original order.
///
/// Null keys compare equal to each other.
pub fn deduplicate(batch: &RecordBatch, key: &str) -> Result<RecordBatch> {
    let column = batch
        .column_by_name(key)
        .ok_or_else(|| Error::schema(key, "key column not found"))?;

    let converter = RowConverter::new(vec![SortField::new(column.data_type().clone())])?;
    let rows = converter.convert_columns(&[column.clone()])?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let mut keep = Vec::with_capacity(rows.num_rows());
    for (idx, row) in rows.iter().enumerate() {
        if seen.insert(row.owned()) {
            let idx = u32::try_from(idx)
                .map_err(|_| Error::output(format!("row index {idx} exceeds u32")))?;
            keep.push(idx);
        }
    }

    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    Ok(take_record_batch(batch, &UInt32Array::from(keep))?)
}

/// Deduplicate a Parquet file in place by `key`.
///
/// The file is only rewritten when duplicates were found.
pub fn deduplicate_file(
    path: impl AsRef<Path>,
    key: &str,
    config: Option<&ParquetWriterConfig>,
) -> Result<DedupReport> {
    let path = path.as_ref();
    let batch = read_parquet(path)?;
    let deduped = deduplicate(&batch, key)?;

    let report = DedupReport {
        rows_before: batch.num_rows(),
        rows_after: deduped.num_rows(),
    };

    if report.removed() == 0 {
        info!("No duplicate {key} values in {}", path.display());
        return Ok(report);
    }

    info!(
        duplicates = report.removed(),
        rows = report.rows_after,
        "Removing duplicate {key} values from {}",
        path.display()
    );
    write_parquet_atomic(path, &deduped, config)?;
    Ok(report)
}
