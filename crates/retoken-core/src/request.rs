//! Outbound request descriptor and the retry marker wrapper.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            _ => Err(InvalidInputError::Other {
                message: format!("unsupported HTTP method '{s}'"),
            }
            .into()),
        }
    }
}

/// An immutable description of one API call.
///
/// Paths are relative to the client's base URL and may carry a query string.
/// Header names are stored lowercased.
///
/// # Example
///
/// ```
/// use retoken_core::{Method, Request};
///
/// let request = Request::post("/bids")
///     .with_json(serde_json::json!({"amount": 120}))
///     .with_header("X-Client", "web");
/// assert_eq!(request.method(), Method::Post);
/// assert_eq!(request.header("x-client"), Some("web"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<serde_json::Value>,
    timeout: Option<Duration>,
}

impl Request {
    /// Create a request with no headers, body or timeout.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            method,
            path,
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Returns a copy of this request with the header set.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a copy of this request with a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns a copy of this request with a per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path without the query string.
    pub fn route(&self) -> &str {
        self.path.split(['?', '#']).next().unwrap_or(&self.path)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// One attempt at sending a request, carrying the retry marker.
///
/// The caller's request is never mutated; a replay after a refresh is a new
/// `Attempt` over the same descriptor with `retried` set.
#[derive(Debug, Clone)]
pub struct Attempt {
    request: Request,
    retried: bool,
}

impl Attempt {
    /// First attempt at a request.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    /// The replay of this attempt after a credential refresh.
    pub fn into_replay(self) -> Self {
        Self {
            request: self.request,
            retried: true,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}
