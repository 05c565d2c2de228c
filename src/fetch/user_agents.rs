//! Browser identities rotated across requests

use crate::error::{Error, Result};
use rand::Rng;

const BROWSER_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

/// A fixed, non-empty pool of User-Agent strings
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: BROWSER_USER_AGENTS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl UserAgentPool {
    /// Create a pool from custom identities
    pub fn new(agents: Vec<String>) -> Result<Self> {
        if agents.is_empty() {
            return Err(Error::invalid_value("user_agents", "pool must not be empty"));
        }
        Ok(Self { agents })
    }

    /// Pick one identity uniformly at random
    pub fn choose(&self) -> &str {
        let idx = rand::rng().random_range(0..self.agents.len());
        &self.agents[idx]
    }

    /// Every identity in the pool
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the pool has no identities
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
