//! Partitioning module
//!
//! Supports: temporal (year, month) keys, an unparsed sentinel partition,
//! append-only Parquet partition files
//!
//! # Overview
//!
//! Aligned batches are split by the (year, month) of each row's start
//! timestamp. Every slice is appended to its partition file:
//! - `trip_data_<year>_<month>.parquet` for rows with a valid key
//! - `trip_data_unparsed.parquet` for rows whose key could not be derived
//!
//! Appends rewrite the whole partition file atomically, so a reader
//! never observes a half-written partition.

mod store;
mod temporal;
mod types;

pub use store::{AppendOutcome, PartitionStore};
pub use temporal::{
    key_mask, parse_timestamp, partition_keys, unparsed_mask, TemporalPartitioner,
    END_DATE_COLUMN, START_DATE_COLUMN, TIMESTAMP_FORMAT,
};
pub use types::{
    BatchTransform, PartitionKey, PartitionTarget, PARTITION_FILE_EXTENSION,
    PARTITION_FILE_PREFIX,
};
