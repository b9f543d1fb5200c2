use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";

/// Default period between job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the try-on client.
///
/// Use [`ClientConfig::builder()`] for ergonomic construction, or
/// [`ClientConfig::default()`] for the local development service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the try-on service.
    pub endpoint: String,

    /// Fixed period between status checks while a job is tracked.
    pub poll_interval: Duration,

    /// Per-request timeout. `None` = requests never time out.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the service base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the period between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Apply a timeout to every request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Build the final [`ClientConfig`].
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:5001");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .with_endpoint("http://tryon.local:8080/")
            .with_poll_interval(Duration::from_secs(2))
            .with_request_timeout(Duration::from_secs(30))
            .build();
        assert_eq!(config.endpoint, "http://tryon.local:8080/");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }
}
