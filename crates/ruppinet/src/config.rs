//! Configuration for the portal client and the background agent.

use std::env;
use std::time::Duration;
use tracing::warn;

/// Base URL of the Ruppin portal API.
const PORTAL_BASE_URL: &str = "https://ruppinet.ruppin.ac.il/Portals";

/// Configuration for the portal HTTP client.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL for the portal API (no trailing slash)
    pub base_url: String,
    /// User agent string
    pub user_agent: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: PORTAL_BASE_URL.to_string(),
            user_agent: concat!("ruppinet/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the background agent binary.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub portal: PortalConfig,
    /// Path of the SQLite key-value store
    pub db_path: String,
    /// Interval between grade poll cycles
    pub poll_interval: Duration,
    /// Maximum retries per cycle for retryable failures
    pub max_poll_retries: u32,
    /// Base delay for the retry backoff
    pub retry_base: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            db_path: "ruppinet.db".to_string(),
            poll_interval: Duration::from_secs(10 * 60),
            max_poll_retries: 3,
            retry_base: Duration::from_secs(2),
        }
    }
}

impl AgentConfig {
    /// Builds an agent config from `RUPPINET_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("RUPPINET_BASE_URL") {
            config.portal.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(path) = env::var("RUPPINET_DB_PATH") {
            config.db_path = path;
        }
        if let Some(secs) = env_u64("RUPPINET_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(retries) = env_u64("RUPPINET_MAX_POLL_RETRIES") {
            config.max_poll_retries = retries as u32;
        }

        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_portal() {
        let config = PortalConfig::default();
        assert!(config.base_url.starts_with("https://ruppinet.ruppin.ac.il"));
        assert!(!config.base_url.ends_with('/'));
    }
}
