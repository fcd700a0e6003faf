//! Gateway connection settings.

use std::time::Duration;

use anyhow::{Context, bail};

use crate::query::INVENTORY_TABLE;

pub const ENV_URL: &str = "PHARMLOC_GATEWAY_URL";
pub const ENV_KEY: &str = "PHARMLOC_GATEWAY_KEY";
pub const ENV_TABLE: &str = "PHARMLOC_TABLE";
pub const ENV_POLL_INTERVAL_MS: &str = "PHARMLOC_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "PHARMLOC_REQUEST_TIMEOUT_MS";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Anonymous/public API key; sent as `apikey` and as the bearer token.
    pub api_key: String,
    pub table: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: INVENTORY_TABLE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` (environment-shaped keys).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let base_url = lookup(ENV_URL).with_context(|| format!("{ENV_URL} must be set"))?;
        let api_key = lookup(ENV_KEY).with_context(|| format!("{ENV_KEY} must be set"))?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("{ENV_URL} must be an http(s) URL, got {base_url:?}");
        }

        let mut config = Self::new(base_url, api_key);

        if let Some(table) = lookup(ENV_TABLE).filter(|t| !t.trim().is_empty()) {
            config.table = table;
        }
        if let Some(ms) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = parse_millis(ENV_POLL_INTERVAL_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = parse_millis(ENV_REQUEST_TIMEOUT_MS, &ms)?;
        }

        Ok(config)
    }

    /// `{base}/rest/v1/{table}`.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn parse_millis(key: &str, raw: &str) -> anyhow::Result<Duration> {
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of milliseconds, got {raw:?}"))?;
    if ms == 0 {
        bail!("{key} must be positive");
    }
    Ok(Duration::from_millis(ms))
}
