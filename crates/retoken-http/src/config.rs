//! HTTP client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use retoken_core::{BaseUrl, ClientConfig};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an HTTP-backed client.
///
/// The auth endpoint and policy settings of [`ClientConfig`] sit at the same
/// level as the HTTP settings:
///
/// ```toml
/// base_url = "https://api.example.com"
/// timeout_secs = 10
///
/// [refresh]
/// path = "/auth/refresh"
///
/// [auth_failure]
/// statuses = [401]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub base_url: BaseUrl,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(flatten)]
    pub client: ClientConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("retoken/", env!("CARGO_PKG_VERSION")).to_string()
}

impl HttpConfig {
    /// Defaults for everything but the base URL.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            client: ClientConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
