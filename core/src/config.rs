//! Client configuration.
//!
//! Construction never fails; checks run when an `OhmyfinClient` is built
//! from the config so a half-filled `ClientConfig` can still be passed
//! around and completed with struct-update syntax.

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://ohmyfin.ai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

pub const API_KEY_VAR: &str = "OHMYFIN_API_KEY";
pub const BASE_URL_VAR: &str = "OHMYFIN_BASE_URL";
pub const TIMEOUT_MS_VAR: &str = "OHMYFIN_TIMEOUT_MS";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Sent as the `KEY` header on every request.
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// The key stays out of debug output and therefore out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from `OHMYFIN_API_KEY`, `OHMYFIN_BASE_URL` and `OHMYFIN_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Configuration(format!("{API_KEY_VAR} is not set")))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|url| !url.is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_MS_VAR).filter(|ms| !ms.is_empty()) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("{TIMEOUT_MS_VAR} must be a number of milliseconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    /// Checks run by the client constructor.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("API key is required".to_string()));
        }
        if self.api_key.chars().any(char::is_control) {
            return Err(Error::Configuration(
                "API key contains characters not allowed in an HTTP header".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Configuration(format!("invalid base URL {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "base URL must use http or https, got {:?}",
                url.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Configuration("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}
