//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use storefront_catalog::{CatalogResult, HttpCatalogClient};

/// Backoff for transient catalog failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry, doubled after each one.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    /// Wait between two draft creations.
    pub draft_pacing: Duration,
    /// Wait between two association writes of one draft.
    pub link_pacing: Duration,
    pub retry: RetryPolicy,
    /// Draft activations in flight at once.
    pub activation_concurrency: usize,
    pub notify_on_activation: bool,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            auth_token: None,
            draft_pacing: Duration::from_millis(500),
            link_pacing: Duration::from_millis(200),
            retry: RetryPolicy::default(),
            activation_concurrency: 1,
            notify_on_activation: true,
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

impl PipelineConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_pacing(mut self, draft: Duration, link: Duration) -> Self {
        self.draft_pacing = draft;
        self.link_pacing = link;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_activation_concurrency(mut self, concurrency: usize) -> Self {
        self.activation_concurrency = concurrency.max(1);
        self
    }

    pub fn with_notify_on_activation(mut self, notify: bool) -> Self {
        self.notify_on_activation = notify;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `STOREFRONT_*` variables; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("STOREFRONT_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        if let Some(token) = lookup("STOREFRONT_API_TOKEN").filter(|v| !v.trim().is_empty()) {
            config.auth_token = Some(token);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_DRAFT_PACING_MS")? {
            config.draft_pacing = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_LINK_PACING_MS")? {
            config.link_pacing = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<u32>(&lookup, "STOREFRONT_MAX_RETRIES")? {
            config.retry.max_retries = n;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_RETRY_BACKOFF_MS")? {
            config.retry.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "STOREFRONT_ACTIVATION_CONCURRENCY")? {
            if n == 0 {
                bail!("STOREFRONT_ACTIVATION_CONCURRENCY must be at least 1");
            }
            config.activation_concurrency = n;
        }
        if let Some(raw) = lookup("STOREFRONT_NOTIFY_ON_ACTIVATION") {
            config.notify_on_activation = parse_flag(&raw)
                .with_context(|| format!("invalid value for STOREFRONT_NOTIFY_ON_ACTIVATION: {raw:?}"))?;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_REQUEST_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// HTTP catalog client for this configuration.
    pub fn http_client(&self) -> CatalogResult<HttpCatalogClient> {
        let client = HttpCatalogClient::new(self.api_url.clone()).with_timeout(self.request_timeout)?;
        Ok(match &self.auth_token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c, PipelineConfig::default());
        assert_eq!(c.draft_pacing, Duration::from_millis(500));
        assert_eq!(c.link_pacing, Duration::from_millis(200));
        assert_eq!(c.retry.max_retries, 0);
        assert_eq!(c.activation_concurrency, 1);
        assert!(c.notify_on_activation);
    }

    #[test]
    fn reads_overrides() {
        let c = PipelineConfig::from_lookup(lookup(&[
            ("STOREFRONT_API_URL", "https://api.example"),
            ("STOREFRONT_API_TOKEN", "t0k"),
            ("STOREFRONT_DRAFT_PACING_MS", "0"),
            ("STOREFRONT_MAX_RETRIES", "3"),
            ("STOREFRONT_ACTIVATION_CONCURRENCY", "4"),
            ("STOREFRONT_NOTIFY_ON_ACTIVATION", "false"),
        ]))
        .unwrap();

        assert_eq!(c.api_url, "https://api.example");
        assert_eq!(c.auth_token.as_deref(), Some("t0k"));
        assert_eq!(c.draft_pacing, Duration::ZERO);
        assert_eq!(c.retry.max_retries, 3);
        assert_eq!(c.activation_concurrency, 4);
        assert!(!c.notify_on_activation);
    }

    #[test]
    fn unparseable_values_are_errors() {
        let err = PipelineConfig::from_lookup(lookup(&[("STOREFRONT_MAX_RETRIES", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_MAX_RETRIES"));

        assert!(PipelineConfig::from_lookup(lookup(&[("STOREFRONT_NOTIFY_ON_ACTIVATION", "maybe")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("STOREFRONT_ACTIVATION_CONCURRENCY", "0")])).is_err());
    }

    #[test]
    fn builds_http_client_from_config() {
        let c = PipelineConfig::default().with_api_url("http://catalog.local/");
        let client = c.http_client().unwrap();
        assert_eq!(client.api_url(), "http://catalog.local");
    }
}
