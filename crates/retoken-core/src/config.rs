//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::policy::AuthFailurePolicy;
use crate::request::{Method, Request};

/// Default path of the token refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default path of the login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Method and path of an auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_method")]
    pub method: Method,
    pub path: String,
}

fn default_method() -> Method {
    Method::Post
}

impl EndpointConfig {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// A request to this endpoint carrying `body`.
    pub(crate) fn request(&self, body: serde_json::Value) -> Request {
        Request::new(self.method, self.path.clone()).with_json(body)
    }
}

/// Configuration of an [`AuthClient`](crate::AuthClient).
///
/// Every field has a default, so a config file only needs to name what
/// differs from the defaults.
///
/// ```
/// use retoken_core::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "refresh": {"path": "/api/token/refresh"},
///     "auth_failure": {"statuses": [401, 419]}
/// }"#).unwrap();
/// assert_eq!(config.refresh.path, "/api/token/refresh");
/// assert_eq!(config.login.path, "/auth/login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_refresh")]
    pub refresh: EndpointConfig,
    #[serde(default = "default_login")]
    pub login: EndpointConfig,
    #[serde(default)]
    pub auth_failure: AuthFailurePolicy,
}

fn default_refresh() -> EndpointConfig {
    EndpointConfig::new(Method::Post, DEFAULT_REFRESH_PATH)
}

fn default_login() -> EndpointConfig {
    EndpointConfig::new(Method::Post, DEFAULT_LOGIN_PATH)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
            login: default_login(),
            auth_failure: AuthFailurePolicy::default(),
        }
    }
}
