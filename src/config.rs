//! Pipeline configuration
//!
//! All settings can be given in one YAML file; every field has a default,
//! so an empty file (or no file) yields a working configuration. CLI flags
//! override individual values after loading.

use crate::error::{Error, Result};
use crate::fetch::{FetchConfig, RetryBackoff, DEFAULT_BASE_URL, DEFAULT_ORDER_BY};
use crate::run_log::{DEFAULT_FETCH_LOG, DEFAULT_INGEST_LOG};
use crate::storage::{ParquetCompression, ParquetWriterConfig};
use crate::types::{LogLevel, SleepRange};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Default log level when `RUST_LOG` is not set
    #[serde(default)]
    pub log_level: LogLevel,

    /// Download settings
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Partition storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestSettings,
}

impl PipelineConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path)
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml(&yaml)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        let fetch = &self.fetch;
        url::Url::parse(&fetch.base_url)?;
        if fetch.page_size == 0 {
            return Err(Error::invalid_value("fetch.page_size", "must be greater than 0"));
        }
        if fetch.max_retries == 0 {
            return Err(Error::invalid_value("fetch.max_retries", "must be greater than 0"));
        }
        if fetch.timeout_secs == 0 {
            return Err(Error::invalid_value("fetch.timeout_secs", "must be greater than 0"));
        }
        if fetch.order_by.trim().is_empty() {
            return Err(Error::invalid_value("fetch.order_by", "must not be empty"));
        }
        if fetch.start_page > fetch.total_pages {
            return Err(Error::invalid_value(
                "fetch.start_page",
                format!(
                    "{} is beyond total_pages {}",
                    fetch.start_page, fetch.total_pages
                ),
            ));
        }
        if self.storage.row_group_size == 0 {
            return Err(Error::invalid_value(
                "storage.row_group_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Fetcher configuration derived from the `fetch` section
    pub fn fetch_config(&self) -> FetchConfig {
        let fetch = &self.fetch;
        FetchConfig::new()
            .with_base_url(&fetch.base_url)
            .with_page_size(fetch.page_size)
            .with_output_dir(&fetch.output_dir)
            .with_pages(fetch.start_page, fetch.total_pages)
            .with_max_retries(fetch.max_retries)
            .with_request_sleep(fetch.request_sleep_secs)
            .with_backoff(RetryBackoff::new(
                fetch.retry_sleep_secs,
                fetch.long_retry_sleep_secs,
                fetch.long_retry_after,
            ))
            .with_timeout(Duration::from_secs(fetch.timeout_secs))
            .with_order_by(&fetch.order_by)
            .with_stop_on_empty_page(fetch.stop_on_empty_page)
            .with_run_log(&fetch.log_file)
    }

    /// Parquet writer settings derived from the `storage` section
    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_compression(self.storage.compression)
            .with_row_group_size(self.storage.row_group_size)
    }
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for downloading raw pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSettings {
    /// Resource URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Directory for raw page files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Zero-based page to resume from
    #[serde(default)]
    pub start_page: u64,

    /// Exclusive upper bound of zero-based pages
    #[serde(default)]
    pub total_pages: u64,

    /// Attempts per page before halting
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sleep after each page, seconds `[min, max]`
    #[serde(default = "default_request_sleep")]
    pub request_sleep_secs: SleepRange,

    /// Sleep between attempts, seconds `[min, max]`
    #[serde(default = "default_retry_sleep")]
    pub retry_sleep_secs: SleepRange,

    /// Sleep between attempts once `long_retry_after` is passed
    #[serde(default = "default_long_retry_sleep")]
    pub long_retry_sleep_secs: SleepRange,

    /// Attempts before the long retry sleep applies
    #[serde(default = "default_long_retry_after")]
    pub long_retry_after: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `$order` field
    #[serde(default = "default_order_by")]
    pub order_by: String,

    /// End the run at the first empty page
    #[serde(default)]
    pub stop_on_empty_page: bool,

    /// Download run log
    #[serde(default = "default_fetch_log")]
    pub log_file: PathBuf,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            output_dir: default_output_dir(),
            start_page: 0,
            total_pages: 0,
            max_retries: default_max_retries(),
            request_sleep_secs: default_request_sleep(),
            retry_sleep_secs: default_retry_sleep(),
            long_retry_sleep_secs: default_long_retry_sleep(),
            long_retry_after: default_long_retry_after(),
            timeout_secs: default_timeout_secs(),
            order_by: default_order_by(),
            stop_on_empty_page: false,
            log_file: default_fetch_log(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u64 {
    1000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("trip_data_2013_2023")
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_sleep() -> SleepRange {
    SleepRange::from_static(7.0, 20.0)
}

fn default_retry_sleep() -> SleepRange {
    SleepRange::from_static(5.0, 15.0)
}

fn default_long_retry_sleep() -> SleepRange {
    SleepRange::from_static(30.0, 60.0)
}

fn default_long_retry_after() -> u32 {
    crate::fetch::DEFAULT_LONG_RETRY_AFTER
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_order_by() -> String {
    DEFAULT_ORDER_BY.to_string()
}

fn default_fetch_log() -> PathBuf {
    PathBuf::from(DEFAULT_FETCH_LOG)
}

// ============================================================================
// Storage Settings
// ============================================================================

/// Settings for partition files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Directory holding partition files
    #[serde(default = "default_partition_dir")]
    pub partition_dir: PathBuf,

    /// Parquet compression codec
    #[serde(default)]
    pub compression: ParquetCompression,

    /// Maximum rows per Parquet row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            partition_dir: default_partition_dir(),
            compression: ParquetCompression::default(),
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_partition_dir() -> PathBuf {
    PathBuf::from("trip_data_parquet")
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

// ============================================================================
// Ingest Settings
// ============================================================================

/// Settings for batch ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestSettings {
    /// Ingestion run log
    #[serde(default = "default_ingest_log")]
    pub log_file: PathBuf,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            log_file: default_ingest_log(),
        }
    }
}

fn default_ingest_log() -> PathBuf {
    PathBuf::from(DEFAULT_INGEST_LOG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_yaml("").unwrap();

        assert_eq!(config.fetch.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fetch.page_size, 1000);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.request_sleep_secs.min(), 7.0);
        assert_eq!(config.fetch.request_sleep_secs.max(), 20.0);
        assert_eq!(config.fetch.order_by, "trip_start_timestamp");
        assert_eq!(config.fetch.log_file, PathBuf::from("file_download.log.txt"));
        assert_eq!(config.storage.partition_dir, PathBuf::from("trip_data_parquet"));
        assert_eq!(config.storage.compression, ParquetCompression::Snappy);
        assert_eq!(config.ingest.log_file, PathBuf::from("json_processing.log.txt"));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
log_level: debug
fetch:
  start_page: 12553
  total_pages: 20000
  max_retries: 40
  request_sleep_secs: [20, 32]
storage:
  compression: zstd
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.fetch.start_page, 12553);
        assert_eq!(config.fetch.total_pages, 20000);
        assert_eq!(config.fetch.max_retries, 40);
        assert_eq!(config.fetch.request_sleep_secs.max(), 32.0);
        assert_eq!(config.fetch.page_size, 1000);
        assert_eq!(config.storage.compression, ParquetCompression::Zstd);

        let fetch = config.fetch_config();
        assert_eq!(fetch.start_page, 12553);
        assert_eq!(fetch.max_retries, 40);
        assert_eq!(fetch.timeout, Duration::from_secs(10));
        assert_eq!(fetch.backoff.range_for(11).min(), 30.0);
    }

    #[test]
    fn test_validation_errors() {
        let err = PipelineConfig::from_yaml("fetch:\n  page_size: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let err = PipelineConfig::from_yaml("fetch:\n  base_url: nope\n").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));

        let err = PipelineConfig::from_yaml("fetch:\n  request_sleep_secs: [9, 3]\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));

        let err = PipelineConfig::from_yaml("fetch:\n  pages: 3\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));

        let err =
            PipelineConfig::from_yaml("fetch:\n  start_page: 5\n  total_pages: 2\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  partition_dir: out/parquet\n  row_group_size: 5000").unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.storage.partition_dir, PathBuf::from("out/parquet"));
        assert_eq!(config.writer_config().row_group_size(), 5000);

        let missing = PipelineConfig::load("/nonexistent/pipeline.yaml").unwrap_err();
        assert!(matches!(missing, Error::FileNotFound { .. }));
    }
}
