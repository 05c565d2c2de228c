//! Fetch module
//!
//! Downloads the paginated trip resource into raw page files.
//!
//! # Features
//!
//! - **Offset Pagination**: `$limit`/`$offset`/`$order` query per page
//! - **Randomized Pacing**: Random sleep between pages and between retries
//! - **Identity Rotation**: Random browser User-Agent per attempt
//! - **Fail-Fast Halting**: A page that exhausts its retries stops the run

mod backoff;
mod client;
mod fetcher;
mod user_agents;

pub use backoff::{RetryBackoff, DEFAULT_LONG_RETRY_AFTER};
pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageResponse};
pub use fetcher::{FetchConfig, FetchReport, Fetcher, DEFAULT_BASE_URL, DEFAULT_ORDER_BY};
pub use user_agents::UserAgentPool;

#[cfg(test)]
mod tests;
