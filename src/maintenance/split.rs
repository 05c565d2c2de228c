//! Even splitting of a Parquet file

use crate::error::{Error, Result};
use crate::storage::{read_parquet, write_batch_to_parquet, ParquetWriterConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Row counts of `parts` outputs covering `total` rows.
///
/// The first `total % parts` outputs get one extra row. `parts` must be
/// positive.
pub fn split_sizes(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let extra = total % parts;
    (0..parts).map(|i| base + usize::from(i < extra)).collect()
}

/// `<stem>_<index><.ext>` next to `path`; `index` is one-based
fn output_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    path.with_file_name(name)
}

/// Split a Parquet file into `parts` files of near-equal row counts.
///
/// Outputs are written as `<stem>_1.<ext>` .. `<stem>_<parts>.<ext>` in row
/// order. The source is deleted afterwards when `remove_source` is set.
pub fn split_file(
    path: impl AsRef<Path>,
    parts: usize,
    remove_source: bool,
    config: Option<&ParquetWriterConfig>,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if parts == 0 {
        return Err(Error::invalid_value("parts", "must be at least 1"));
    }

    let batch = read_parquet(path)?;
    let mut outputs = Vec::with_capacity(parts);
    let mut offset = 0;

    for (i, size) in split_sizes(batch.num_rows(), parts).into_iter().enumerate() {
        let output = output_path(path, i + 1);
        write_batch_to_parquet(&output, &batch.slice(offset, size), config)?;
        offset += size;
        outputs.push(output);
    }

    info!(
        parts,
        rows = batch.num_rows(),
        "Split {} into {} files",
        path.display(),
        outputs.len()
    );

    if remove_source {
        std::fs::remove_file(path)?;
    }

    Ok(outputs)
}
