//! Append-only run logs
//!
//! Plain-text progress records kept next to the data: one line per page
//! downloaded or batch file processed. They survive restarts and tell an
//! operator which page or file to resume from.

use crate::error::{Error, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Wall-clock format used in run log lines
pub const RUN_LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default run log of the fetcher
pub const DEFAULT_FETCH_LOG: &str = "file_download.log.txt";

/// Default run log of the ingestor
pub const DEFAULT_INGEST_LOG: &str = "json_processing.log.txt";

/// An append-only text log
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Log appending to `path`, created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line; a trailing newline is added
    pub fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                Error::output(format!(
                    "Failed to open run log {}: {e}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// `[<ts>] Page: <page>, File: <file>`; `page` is one-based
    pub fn record_page(&self, page: u64, file_name: &str) -> Result<()> {
        self.append(&format!(
            "[{}] Page: {page}, File: {file_name}",
            now_stamp()
        ))
    }

    /// `<ts> | Processed file: <path> | Duration: <s.ss> seconds | Status: <status>`
    pub fn record_batch(&self, path: &Path, duration: Duration, status: &str) -> Result<()> {
        self.append(&format!(
            "{} | Processed file: {} | Duration: {:.2} seconds | Status: {status}",
            now_stamp(),
            path.display(),
            duration.as_secs_f64()
        ))
    }
}

fn now_stamp() -> String {
    Local::now().format(RUN_LOG_TIME_FORMAT).to_string()
}
