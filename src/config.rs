use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PORTAL_URL: &str = "https://portal.gupy.io";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub chrome_path: Option<PathBuf>,
    pub scrape: ScrapeOptions,
}

/// Knobs shared by the collector, the detail fetcher and the worker pool.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub portal_url: String,
    pub headless: bool,
    pub worker_count: usize,
    pub settle_delay: Duration,
    pub detail_timeout: Duration,
    pub max_scroll_rounds: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            headless: true,
            worker_count: 5,
            settle_delay: Duration::from_secs(3),
            detail_timeout: Duration::from_secs(15),
            max_scroll_rounds: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ScrapeOptions::default();

        let worker_count: usize = parse_or(&lookup, "WORKER_COUNT", defaults.worker_count)?;
        if worker_count == 0 {
            return Err(ConfigError {
                key: "WORKER_COUNT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let max_scroll_rounds: usize =
            parse_or(&lookup, "MAX_SCROLL_ROUNDS", defaults.max_scroll_rounds)?;
        if max_scroll_rounds == 0 {
            return Err(ConfigError {
                key: "MAX_SCROLL_ROUNDS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let scrape = ScrapeOptions {
            portal_url: lookup("PORTAL_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.portal_url),
            headless: parse_or(&lookup, "HEADLESS", defaults.headless)?,
            worker_count,
            settle_delay: Duration::from_secs(parse_or(
                &lookup,
                "SETTLE_DELAY_SECS",
                defaults.settle_delay.as_secs(),
            )?),
            detail_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DETAIL_TIMEOUT_SECS",
                defaults.detail_timeout.as_secs(),
            )?),
            max_scroll_rounds,
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
            chrome_path: lookup("CHROME_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            scrape,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
