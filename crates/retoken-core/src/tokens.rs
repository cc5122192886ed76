//! Token types for API authentication.

use std::fmt;

use serde::Deserialize;

/// An access token for authenticated API requests.
///
/// Access tokens are short-lived bearer credentials attached to every call.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers or persisting
    /// the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// Refresh tokens are longer-lived and used solely against the refresh
/// endpoint.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The access/refresh token pair held by a credential store.
///
/// The pair is always replaced as a whole; there is no way to update one half
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
}

impl CredentialPair {
    /// Create a pair from its two halves.
    pub fn new(access_token: Option<AccessToken>, refresh_token: Option<RefreshToken>) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    /// An empty pair, as held by a signed-out store.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Returns true if neither token is present.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Token pair returned by the login and refresh endpoints.
///
/// Both camelCase and snake_case field names are accepted.
#[derive(Debug, Deserialize)]
pub struct TokenPairResponse {
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,
    #[serde(rename = "refreshToken", alias = "refresh_token", default)]
    pub refresh_token: Option<String>,
}

impl TokenPairResponse {
    /// Build the replacement pair.
    ///
    /// Servers that do not rotate refresh tokens omit the field; the previous
    /// refresh token is kept in that case.
    pub fn into_pair(self, previous_refresh: Option<&RefreshToken>) -> CredentialPair {
        let refresh_token = self
            .refresh_token
            .map(RefreshToken::new)
            .or_else(|| previous_refresh.cloned());
        CredentialPair::new(Some(AccessToken::new(self.access_token)), refresh_token)
    }
}
