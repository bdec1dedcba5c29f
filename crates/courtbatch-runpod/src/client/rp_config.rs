//! Configuration for the RunPod HTTP client.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default RunPod API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.runpod.ai";

/// Configuration for the RunPod HTTP client.
///
/// # Examples
///
/// ```ignore
/// use courtbatch_runpod::RunpodConfig;
/// use std::time::Duration;
///
/// let config = RunpodConfig::new("my-endpoint", "rp_secret")?
///     .with_timeout(Duration::from_secs(10))
///     .with_max_retries(5);
/// ```
#[derive(Clone)]
pub struct RunpodConfig {
    /// Base URL of the RunPod API
    base_url: Url,

    /// Serverless endpoint id
    endpoint_id: String,

    /// API key sent as a bearer token
    api_key: String,

    /// Request timeout duration
    timeout: Duration,

    /// Maximum number of retry attempts for retryable status and cancel errors
    max_retries: u32,

    /// Base delay for linear backoff
    retry_backoff: Duration,

    /// User agent string for HTTP requests
    user_agent: String,
}

impl RunpodConfig {
    /// Create a configuration for `endpoint_id` against the public API.
    pub fn new(endpoint_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let endpoint_id = endpoint_id.into();
        if endpoint_id.trim().is_empty() {
            return Err(Error::config("endpoint id must not be empty"));
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty"));
        }

        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| Error::config(format!("Invalid base URL '{DEFAULT_BASE_URL}': {e}")))?;

        Ok(Self {
            base_url,
            endpoint_id,
            api_key,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            user_agent: format!("courtbatch-runpod/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Get the base URL of the RunPod API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the endpoint id.
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of retry attempts.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the retry backoff duration.
    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Get the user agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Set the base URL, e.g. for a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            Error::config(format!("Invalid base URL '{}': {}", base_url.as_ref(), e))
        })?;
        Ok(self)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retry backoff duration.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the URL of an endpoint operation, e.g. `run` or `status/{id}`.
    pub(crate) fn endpoint_url(&self, operation: &str) -> Result<Url> {
        let path = format!("/v2/{}/{}", self.endpoint_id, operation);
        self.base_url
            .join(&path)
            .map_err(|e| Error::config(format!("Failed to construct API URL '{path}': {e}")))
    }
}

impl std::fmt::Debug for RunpodConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunpodConfig")
            .field("base_url", &self.base_url.as_str())
            .field("endpoint_id", &self.endpoint_id)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let config = RunpodConfig::new("abc123", "key").unwrap();

        assert_eq!(
            config.endpoint_url("run").unwrap().as_str(),
            "https://api.runpod.ai/v2/abc123/run"
        );
        assert_eq!(
            config.endpoint_url("status/job-1").unwrap().as_str(),
            "https://api.runpod.ai/v2/abc123/status/job-1"
        );
    }

    #[test]
    fn custom_base_url() {
        let config = RunpodConfig::new("abc123", "key")
            .unwrap()
            .with_base_url("http://localhost:8000")
            .unwrap();

        assert_eq!(
            config.endpoint_url("cancel/j").unwrap().as_str(),
            "http://localhost:8000/v2/abc123/cancel/j"
        );
    }

    #[test]
    fn rejects_empty_credentials() {
        assert!(RunpodConfig::new("", "key").is_err());
        assert!(RunpodConfig::new("abc", " ").is_err());
        assert!(RunpodConfig::new("abc", "key").unwrap().with_base_url("not a url").is_err());
    }

    #[test]
    fn debug_hides_api_key() {
        let config = RunpodConfig::new("abc", "super-secret").unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
