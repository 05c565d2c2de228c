//! Maintenance utilities
//!
//! Offline operations on files the pipeline has already produced:
//! deduplicating a partition by key, splitting an oversized partition,
//! and normalizing raw page filenames.

mod dedup;
mod rename;
mod split;

pub use dedup::{deduplicate, deduplicate_file, DedupReport};
pub use rename::{normalize_page_filenames, RenamedFile};
pub use split::{split_file, split_sizes};

#[cfg(test)]
mod tests;
