//! CLI module
//!
//! Command-line interface for the pipeline.

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
