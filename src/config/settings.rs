//! Runtime settings read from environment variables.
//!
//! Every setting has a default so the binary runs with an empty `.env`.

use crate::errors::{Error, Result};
use std::time::Duration;

/// Settings for the price feed and the scheduler
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the exchange REST API (`PRICE_FEED_URL`)
    pub price_feed_url: String,
    /// Timeout applied to every price feed call (`PRICE_FEED_TIMEOUT_SECS`)
    pub price_feed_timeout: Duration,
    /// Scheduler polling interval (`SCHEDULER_POLL_SECS`)
    pub poll_interval: Duration,
    /// Path to the catalog seed file (`CATALOG_PATH`)
    pub catalog_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            price_feed_url: "https://api.binance.com".to_string(),
            price_feed_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(60),
            catalog_path: "config.toml".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from the environment, falling back to the defaults.
    ///
    /// # Errors
    /// Returns `Error::Config` if a numeric setting is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            price_feed_url: lookup("PRICE_FEED_URL").unwrap_or(defaults.price_feed_url),
            price_feed_timeout: parse_secs(&lookup, "PRICE_FEED_TIMEOUT_SECS")?
                .unwrap_or(defaults.price_feed_timeout),
            poll_interval: parse_secs(&lookup, "SCHEDULER_POLL_SECS")?
                .unwrap_or(defaults.poll_interval),
            catalog_path: lookup("CATALOG_PATH").unwrap_or(defaults.catalog_path),
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(Error::Config {
            message: format!("{key} must be a positive number of seconds, got '{raw}'"),
        }),
    }
}
