//! Remote store client configuration.

use std::time::Duration;

/// Connection settings for [`HttpRemoteStore`](super::HttpRemoteStore).
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL used to open account sessions.
    pub api_url: String,
    /// Account key id.
    pub key_id: String,
    /// Account application key.
    pub application_key: String,
    /// How long a cached session is trusted before re-authorizing.
    pub session_ttl: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Default session lifetime: 50 minutes, under the store's
    /// 24-hour token validity with a wide margin.
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3000);
    /// Default request timeout: 30 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a config with default timing.
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        key_id: impl Into<String>,
        application_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            key_id: key_id.into(),
            application_key: application_key.into(),
            session_ttl: Self::DEFAULT_SESSION_TTL,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the cached-session lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RemoteConfig::new("https://api.example.com", "key", "secret");
        assert_eq!(config.session_ttl, RemoteConfig::DEFAULT_SESSION_TTL);
        assert_eq!(config.timeout, RemoteConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_config_builders_override_timing() {
        let config = RemoteConfig::new("https://api.example.com", "key", "secret")
            .with_session_ttl(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
