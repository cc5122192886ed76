//! reqwest-backed transport.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

use retoken_core::{
    BaseUrl, Error, Method, Request, Response, Transport, TransportError,
};

use crate::config::HttpConfig;

/// Sends requests relative to a base URL with reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base: BaseUrl,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport for `base` with a default per-request timeout.
    pub fn new(base: BaseUrl, timeout: Duration, user_agent: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, Error> {
        Self::new(config.base_url.clone(), config.timeout(), &config.user_agent)
    }

    /// Returns the base URL this transport is configured for.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(base = %self.base, method = %request.method(), path = %request.route()))]
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.base.endpoint_url(request.path());
        let timeout = request.timeout().unwrap_or(self.timeout);
        debug!(%url, "HTTP request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method()), &url)
            .timeout(timeout);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status().as_u16();
        trace!(status, "HTTP response");

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        Ok(Response::new(status, headers, body.to_vec()))
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: duration_ms(timeout),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
