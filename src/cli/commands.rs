//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chicago taxi trips download and partitioning pipeline
#[derive(Parser, Debug)]
#[command(name = "taxi-trips")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download raw pages from the trips endpoint
    Fetch {
        /// Zero-based page to resume from
        #[arg(long)]
        start_page: Option<u64>,

        /// Exclusive upper bound of zero-based pages
        #[arg(long)]
        total_pages: Option<u64>,

        /// Attempts per page before the run halts
        #[arg(long)]
        max_retries: Option<u32>,

        /// Directory for raw page files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Append raw batch files to the monthly partitions
    Ingest {
        /// Batch files to ingest, in order
        files: Vec<PathBuf>,

        /// Directory of raw page files (used with --first-page/--last-page)
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// First one-based page to ingest from --input-dir
        #[arg(long, requires = "last_page")]
        first_page: Option<u64>,

        /// Last one-based page to ingest from --input-dir (inclusive)
        #[arg(long, requires = "first_page")]
        last_page: Option<u64>,

        /// Directory holding partition files
        #[arg(short, long)]
        partition_dir: Option<PathBuf>,

        /// Skip timestamp parsing; every row goes to the unparsed partition
        #[arg(long)]
        raw: bool,
    },

    /// Remove duplicate rows from a Parquet file, keeping the first
    Dedup {
        /// Parquet file to deduplicate in place
        file: PathBuf,

        /// Key column
        #[arg(long, default_value = "trip_id")]
        key: String,
    },

    /// Split a Parquet file into evenly sized parts
    Split {
        /// Parquet file to split
        file: PathBuf,

        /// Number of output files
        #[arg(short = 'n', long)]
        parts: usize,

        /// Delete the source after splitting
        #[arg(long)]
        remove_source: bool,
    },

    /// Zero-pad page numbers in raw page filenames
    PadNames {
        /// Directory of raw page files
        #[arg(long)]
        dir: PathBuf,

        /// First page number to rename
        #[arg(long)]
        start: u64,

        /// Last page number to rename (inclusive)
        #[arg(long)]
        end: u64,

        /// Digits to pad to
        #[arg(long, default_value = "5")]
        width: usize,
    },
}
