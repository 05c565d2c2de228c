// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Taxi Trips
//!
//! Downloads the Chicago taxi trips dataset page by page and folds the raw
//! pages into monthly Parquet partitions.
//!
//! ## Features
//!
//! - **Paginated Download**: Offset pagination with randomized pacing and fail-fast halting
//! - **Canonical Schema**: Every batch is aligned to one fixed, typed column set
//! - **Temporal Partitioning**: Rows grouped by (year, month) of their start timestamp
//! - **Append-Only Partitions**: Union-of-columns appends, atomic file replacement
//! - **Maintenance**: Deduplication, splitting, filename normalization
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taxi_trips::ingest::Ingestor;
//! use taxi_trips::partition::{PartitionStore, TemporalPartitioner};
//! use taxi_trips::schema::CanonicalSchema;
//!
//! let schema = CanonicalSchema::trip_events();
//! let ingestor = Ingestor::new(schema.clone(), PartitionStore::new("trip_data_parquet"));
//! let partitioner = TemporalPartitioner::new(&schema);
//!
//! let report = ingestor.ingest("trip_data_2013_2023/trip_data_page_00001.json", Some(&partitioner))?;
//! println!("{} rows in {} partitions", report.rows, report.partitions.len());
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  Fetcher ──► raw page files ──► Ingestor
//!                                   │
//!                  ┌────────────────┼─────────────────┐
//!                  ▼                ▼                 ▼
//!            Column Aligner   Temporal Partitioner  PartitionStore
//!            (schema)         (partition)           (Parquet files)
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Canonical schema and column alignment
pub mod schema;

/// Arrow/Parquet storage
pub mod storage;

/// Temporal partitioning and partition files
pub mod partition;

/// Batch ingestion orchestration
pub mod ingest;

/// Paginated download
pub mod fetch;

/// Deduplication, splitting and filename normalization
pub mod maintenance;

/// Append-only run logs
pub mod run_log;

/// Pipeline configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use ingest::Ingestor;
pub use partition::{PartitionStore, TemporalPartitioner};
pub use schema::CanonicalSchema;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
