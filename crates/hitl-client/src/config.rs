//! Gateway configuration: backend base URL and request timeout.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8060/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API base URL must be an http:// or https:// URL, got `{0}`")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config for the given base URL with the default timeout.
    ///
    /// A trailing slash is dropped so endpoint segments append after the
    /// last path segment of the base.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .ok_or_else(|| ConfigError::InvalidBaseUrl(base_url.to_string()))?;
        Ok(Self {
            base_url: url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = ClientConfig::new("https://hitl.internal.example/api/v1/").unwrap();
        assert_eq!(config.base_url().as_str(), "https://hitl.internal.example/api/v1");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn default_url_is_accepted() {
        let config = ClientConfig::new(DEFAULT_API_URL)
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url().as_str(), DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_non_http_urls() {
        for bad in ["localhost:8060", "ftp://example.com/api", "", "not a url"] {
            assert_eq!(
                ClientConfig::new(bad),
                Err(ConfigError::InvalidBaseUrl(bad.into())),
                "{bad}"
            );
        }
    }
}
