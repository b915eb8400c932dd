//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default PagerDuty events API endpoint.
pub const DEFAULT_EVENTS_API_ENDPOINT: &str = "https://events.pagerduty.com";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for `ChangeEventClient` and the bundled transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the v2 events API. Must not be empty when a request is
    /// built.
    #[serde(default = "default_events_api_endpoint")]
    pub events_api_endpoint: String,

    /// User-Agent header to send with requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,
}

fn default_events_api_endpoint() -> String {
    DEFAULT_EVENTS_API_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            events_api_endpoint: default_events_api_endpoint(),
            user_agent: None,
            http_timeout: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at the given events API endpoint.
    pub fn new(events_api_endpoint: impl Into<String>) -> Self {
        Self::default().with_events_api_endpoint(events_api_endpoint)
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            self.timeout()
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("pagerduty-core/{}", env!("CARGO_PKG_VERSION")))
    }

    #[must_use]
    pub fn with_events_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.events_api_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }
}
