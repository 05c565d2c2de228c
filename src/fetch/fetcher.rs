//! Paginated page fetcher
//!
//! Walks `$offset` pages of the remote resource in ascending order and
//! persists each page body verbatim as a raw batch file. A page that keeps
//! failing halts the whole run so the downloaded set never has gaps.

use super::backoff::RetryBackoff;
use super::client::{HttpClient, HttpClientConfig};
use super::user_agents::UserAgentPool;
use crate::error::{Error, Result};
use crate::run_log::RunLog;
use crate::types::{page_file_name, SleepRange};
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Default Chicago taxi trips resource
pub const DEFAULT_BASE_URL: &str = "https://data.cityofchicago.org/resource/wrvz-psew.json";

/// Default sort field; pages are only stable under a fixed order
pub const DEFAULT_ORDER_BY: &str = "trip_start_timestamp";

/// Configuration for a fetch run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Resource URL
    pub base_url: String,
    /// Records per page (`$limit`)
    pub page_size: u64,
    /// Directory raw page files are written to
    pub output_dir: PathBuf,
    /// Zero-based page index to resume from
    pub start_page: u64,
    /// Exclusive upper bound of zero-based page indexes
    pub total_pages: u64,
    /// Attempts per page before the run halts
    pub max_retries: u32,
    /// Sleep after each successful page
    pub request_sleep: SleepRange,
    /// Sleep between failed attempts
    pub backoff: RetryBackoff,
    /// Per-request timeout
    pub timeout: Duration,
    /// `$order` field
    pub order_by: String,
    /// End the run at the first successful page with no records
    pub stop_on_empty_page: bool,
    /// Append-only download log
    pub run_log: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 1000,
            output_dir: PathBuf::from("trip_data_2013_2023"),
            start_page: 0,
            total_pages: 0,
            max_retries: 3,
            request_sleep: SleepRange::from_static(7.0, 20.0),
            backoff: RetryBackoff::default(),
            timeout: Duration::from_secs(10),
            order_by: DEFAULT_ORDER_BY.to_string(),
            stop_on_empty_page: false,
            run_log: None,
        }
    }
}

impl FetchConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set records per page
    #[must_use]
    pub fn with_page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the page range `start_page..total_pages`
    #[must_use]
    pub fn with_pages(mut self, start_page: u64, total_pages: u64) -> Self {
        self.start_page = start_page;
        self.total_pages = total_pages;
        self
    }

    /// Set attempts per page
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the inter-request sleep
    #[must_use]
    pub fn with_request_sleep(mut self, range: SleepRange) -> Self {
        self.request_sleep = range;
        self
    }

    /// Set the retry backoff
    #[must_use]
    pub fn with_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `$order` field
    #[must_use]
    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = field.into();
        self
    }

    /// Stop at the first empty page
    #[must_use]
    pub fn with_stop_on_empty_page(mut self, stop: bool) -> Self {
        self.stop_on_empty_page = stop;
        self
    }

    /// Record downloaded pages in a run log
    #[must_use]
    pub fn with_run_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_log = Some(path.into());
        self
    }
}

/// Result of a fetch run
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Raw page files written, in page order
    pub pages_written: Vec<PathBuf>,
    /// One-based page number the run halted on after exhausting retries
    pub halted_at: Option<u64>,
    /// The error that halted the run
    pub error: Option<Error>,
    /// Whether the run ended early on an empty page
    pub stopped_on_empty_page: bool,
}

impl FetchReport {
    /// Whether every requested page was written
    pub fn is_complete(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// A page that was fetched and persisted
struct SavedPage {
    path: PathBuf,
    records: usize,
}

/// Paginated downloader
pub struct Fetcher {
    client: HttpClient,
    config: FetchConfig,
    base_url: Url,
    user_agents: UserAgentPool,
    run_log: Option<RunLog>,
}

impl Fetcher {
    /// Create a fetcher, validating the URL and retry count
    pub fn new(config: FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if config.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }
        if config.max_retries == 0 {
            return Err(Error::invalid_value("max_retries", "must be greater than 0"));
        }

        let client = HttpClient::with_config(
            HttpClientConfig::builder()
                .timeout(config.timeout)
                .header("Accept", "application/json")
                .build(),
        )?;
        let run_log = config.run_log.clone().map(RunLog::new);

        Ok(Self {
            client,
            config,
            base_url,
            user_agents: UserAgentPool::default(),
            run_log,
        })
    }

    /// Use a custom User-Agent pool
    #[must_use]
    pub fn with_user_agents(mut self, pool: UserAgentPool) -> Self {
        self.user_agents = pool;
        self
    }

    /// Get the fetch configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download every page in `start_page..total_pages`.
    ///
    /// Exhausted retries are reported in the returned report, not as an
    /// `Err`; local I/O failures are returned as errors.
    pub async fn run(&self) -> Result<FetchReport> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let mut report = FetchReport::default();
        let last = self.config.total_pages;

        info!(
            start_page = self.config.start_page,
            total_pages = last,
            "Starting download into {}",
            self.config.output_dir.display()
        );

        for page in self.config.start_page..last {
            match self.fetch_page(page).await {
                Ok(saved) => {
                    report.pages_written.push(saved.path);

                    if saved.records == 0 && self.config.stop_on_empty_page {
                        info!(page = page + 1, "Empty page, stopping download");
                        report.stopped_on_empty_page = true;
                        break;
                    }

                    if page + 1 < last {
                        let delay = self.config.request_sleep.sample();
                        debug!("Sleeping for {:.2} seconds to avoid rate limits", delay.as_secs_f64());
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e @ Error::MaxRetriesExceeded { .. }) => {
                    error!("Failed to download page {}, stopping the download: {e}", page + 1);
                    report.halted_at = Some(page + 1);
                    report.error = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            pages = report.pages_written.len(),
            complete = report.is_complete(),
            "Download finished"
        );
        Ok(report)
    }

    /// Fetch one zero-based page with retries and persist it
    async fn fetch_page(&self, page: u64) -> Result<SavedPage> {
        let offset = page * self.config.page_size;
        let query = [
            ("$limit", self.config.page_size.to_string()),
            ("$offset", offset.to_string()),
            ("$order", self.config.order_by.clone()),
        ];
        let max_retries = self.config.max_retries;

        debug!(page = page + 1, offset, "Downloading page");

        for attempt in 1..=max_retries {
            let agent = self.user_agents.choose();
            match self.attempt(&query, agent).await {
                Ok((body, records)) => return self.save(page, &body, records),
                Err(e) => {
                    if attempt == max_retries {
                        warn!(
                            retryable = e.is_retryable(),
                            "Page {} attempt {}/{} failed: {e}",
                            page + 1,
                            attempt,
                            max_retries
                        );
                        break;
                    }
                    let delay = self.config.backoff.delay_for(attempt);
                    warn!(
                        retryable = e.is_retryable(),
                        "Page {} attempt {}/{} failed: {e}, retrying in {:.2}s",
                        page + 1,
                        attempt,
                        max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(Error::MaxRetriesExceeded {
            page: page + 1,
            max_retries,
        })
    }

    /// One request; a 2xx body must be a JSON array
    async fn attempt(&self, query: &[(&str, String)], agent: &str) -> Result<(Bytes, usize)> {
        let response = self
            .client
            .get(self.base_url.as_str(), query, Some(agent))
            .await?;

        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| Error::decode(format!("body is not valid JSON: {e}")))?;
        let records = value
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| Error::decode("body is not a JSON array"))?;

        Ok((response.body, records))
    }

    fn save(&self, page: u64, body: &Bytes, records: usize) -> Result<SavedPage> {
        let file_name = page_file_name(page + 1);
        let path = self.config.output_dir.join(&file_name);
        std::fs::write(&path, body)?;

        if let Some(run_log) = &self.run_log {
            run_log.record_page(page + 1, &file_name)?;
        }

        info!(records, "Downloaded and saved page {} to {}", page + 1, path.display());
        Ok(SavedPage { path, records })
    }
}
