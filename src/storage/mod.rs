//! Storage module
//!
//! The columnar storage layer the pipeline runs on: Arrow RecordBatches in
//! memory, Parquet files on disk.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Loading raw JSON batch files into RecordBatches
//! - Reading Parquet files back into a single RecordBatch
//! - Writing Parquet files, optionally replacing them atomically
//! - Concatenating batches with differing column sets

mod concat;
mod json;
mod reader;
mod writer;

pub use concat::{concat_diagonal, union_schema};
pub use json::{infer_schema, json_to_arrow, read_json_batch};
pub use reader::{parquet_row_count, read_parquet};
pub use writer::{
    write_batch_to_parquet, write_parquet_atomic, ParquetCompression, ParquetWriter,
    ParquetWriterConfig,
};
