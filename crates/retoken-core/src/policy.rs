//! Classification of responses into success, failure and auth expiry.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::request::Attempt;
use crate::response::Response;

/// Decides which responses count as an expired access token.
///
/// The trigger surface is deliberately narrow: by default only status 401
/// qualifies, and the refresh endpoint is always excluded so that a rejected
/// refresh can never start another refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailurePolicy {
    /// Statuses that signal an expired or missing access token.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<u16>,

    /// Server error codes (the `error` field of a JSON error body) that signal
    /// an expired access token regardless of status.
    #[serde(default)]
    pub error_codes: Vec<String>,

    /// Request paths whose auth failures are never recovered.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

fn default_statuses() -> Vec<u16> {
    vec![401]
}

impl Default for AuthFailurePolicy {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            error_codes: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

/// How a single response is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Return the response to the caller.
    Success,
    /// Return a protocol error to the caller, untouched.
    Failure,
    /// Refresh the credentials and replay.
    AuthExpired,
    /// Auth failure on an attempt that was already replayed.
    RetryExhausted,
}

impl AuthFailurePolicy {
    /// Adds `path` to the excluded paths.
    pub fn excluding(mut self, path: impl Into<String>) -> Self {
        let path = normalize(&path.into());
        if !self.excluded_paths.iter().any(|p| normalize(p) == path) {
            self.excluded_paths.push(path);
        }
        self
    }

    /// Returns true if `response` signals an authentication failure.
    pub fn is_auth_failure(&self, response: &Response) -> bool {
        if self.statuses.contains(&response.status()) {
            return true;
        }
        if response.is_success() || self.error_codes.is_empty() {
            return false;
        }
        #[derive(Deserialize)]
        struct Code {
            error: Option<String>,
        }
        serde_json::from_slice::<Code>(response.bytes())
            .ok()
            .and_then(|c| c.error)
            .is_some_and(|code| self.error_codes.contains(&code))
    }

    /// Returns true if auth failures on `route` are passed through.
    pub fn is_excluded(&self, route: &str) -> bool {
        let route = normalize(route);
        self.excluded_paths.iter().any(|p| normalize(p) == route)
    }

    /// Classify the response to `attempt`.
    pub fn classify(&self, attempt: &Attempt, response: &Response) -> Verdict {
        if !self.is_auth_failure(response) {
            return if response.is_success() {
                Verdict::Success
            } else {
                Verdict::Failure
            };
        }
        if attempt.is_retried() {
            Verdict::RetryExhausted
        } else if self.is_excluded(attempt.request().route()) {
            Verdict::Failure
        } else {
            Verdict::AuthExpired
        }
    }
}

impl Verdict {
    /// Turn a terminal verdict into the caller-visible result.
    ///
    /// `AuthExpired` is not terminal; passing it here yields the plain
    /// protocol error.
    pub fn into_result(self, attempt: &Attempt, response: Response) -> Result<Response, Error> {
        match self {
            Verdict::Success => Ok(response),
            Verdict::RetryExhausted => Err(Error::RetryExhausted(
                response.to_protocol_error(attempt.request()),
            )),
            Verdict::Failure | Verdict::AuthExpired => Err(Error::Protocol(
                response.to_protocol_error(attempt.request()),
            )),
        }
    }
}

fn normalize(path: &str) -> String {
    let route = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = route.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use serde_json::json;

    fn policy() -> AuthFailurePolicy {
        AuthFailurePolicy::default().excluding("/auth/refresh")
    }

    #[test]
    fn success_and_plain_failure() {
        let attempt = Attempt::new(Request::get("/projects"));
        assert_eq!(
            policy().classify(&attempt, &Response::empty(200)),
            Verdict::Success
        );
        assert_eq!(
            policy().classify(&attempt, &Response::empty(403)),
            Verdict::Failure
        );
    }

    #[test]
    fn first_401_triggers_refresh() {
        let attempt = Attempt::new(Request::get("/projects"));
        assert_eq!(
            policy().classify(&attempt, &Response::empty(401)),
            Verdict::AuthExpired
        );
    }

    #[test]
    fn retried_401_is_exhausted() {
        let attempt = Attempt::new(Request::get("/projects")).into_replay();
        assert_eq!(
            policy().classify(&attempt, &Response::empty(401)),
            Verdict::RetryExhausted
        );
    }

    #[test]
    fn refresh_endpoint_401_passes_through() {
        let attempt = Attempt::new(Request::post("/auth/refresh/"));
        assert_eq!(
            policy().classify(&attempt, &Response::empty(401)),
            Verdict::Failure
        );
    }

    #[test]
    fn excluded_path_ignores_query() {
        let policy = policy().excluding("auth/logout");
        assert!(policy.is_excluded("/auth/logout?all=true"));
        assert!(!policy.is_excluded("/auth/logout/everywhere"));
    }

    #[test]
    fn excluding_twice_keeps_one_entry() {
        let policy = policy().excluding("/auth/refresh");
        assert_eq!(policy.excluded_paths.len(), 1);
    }

    #[test]
    fn configured_error_code_triggers_refresh() {
        let policy = AuthFailurePolicy {
            error_codes: vec!["ExpiredToken".into()],
            ..AuthFailurePolicy::default()
        };
        let attempt = Attempt::new(Request::get("/projects"));
        let response = Response::json_body(400, &json!({"error": "ExpiredToken"}));
        assert_eq!(policy.classify(&attempt, &response), Verdict::AuthExpired);

        let other = Response::json_body(400, &json!({"error": "InvalidRequest"}));
        assert_eq!(policy.classify(&attempt, &other), Verdict::Failure);
    }

    #[test]
    fn extra_status_is_configurable() {
        let policy = AuthFailurePolicy {
            statuses: vec![401, 419],
            ..AuthFailurePolicy::default()
        };
        let attempt = Attempt::new(Request::get("/projects"));
        assert_eq!(
            policy.classify(&attempt, &Response::empty(419)),
            Verdict::AuthExpired
        );
    }

    #[test]
    fn retry_exhausted_result_carries_status() {
        let attempt = Attempt::new(Request::get("/projects")).into_replay();
        let err = Verdict::RetryExhausted
            .into_result(&attempt, Response::empty(401))
            .unwrap_err();
        assert!(matches!(err, Error::RetryExhausted(ref e) if e.status == 401));
    }
}
