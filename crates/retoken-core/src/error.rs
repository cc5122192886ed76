//! Error types for retoken.
//!
//! This module provides a unified error type with explicit variants for
//! transport, protocol, refresh, retry and input validation errors.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::request::Method;

/// The unified error type for retoken operations.
///
/// Callers only ever see a successful (possibly delayed) response or one of
/// these terminal errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The API answered with a non-success status.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The token refresh failed. Every caller affected by the same refresh
    /// episode receives the same shared instance.
    #[error("token refresh failed: {0}")]
    RefreshFailed(Arc<RefreshFailedError>),

    /// A request that was already replayed after a refresh was rejected again.
    #[error("authentication failed after retry: {0}")]
    RetryExhausted(ProtocolError),

    /// Input validation errors (base URL, path, header).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

impl Error {
    /// Returns the shared refresh failure, if this error is one.
    pub fn refresh_failure(&self) -> Option<&Arc<RefreshFailedError>> {
        match self {
            Error::RefreshFailed(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(err) | Error::RetryExhausted(err) => Some(err.status),
            Error::RefreshFailed(err) => match err.as_ref() {
                RefreshFailedError::Rejected(protocol) => Some(protocol.status),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Protocol-level errors from non-success API responses.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Method of the request that failed.
    pub method: Method,
    /// Path of the request that failed.
    pub path: String,
    /// Server error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({} {})", self.status, self.method, self.path)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(
        status: u16,
        method: Method,
        path: impl Into<String>,
        error: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            status,
            method,
            path: path.into(),
            error,
            message,
        }
    }
}

/// Why a token refresh episode failed.
#[derive(Debug, Error)]
pub enum RefreshFailedError {
    /// No refresh token was stored, so no refresh call was made.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint rejected the refresh token.
    #[error("refresh rejected: {0}")]
    Rejected(ProtocolError),

    /// The refresh call never produced a response.
    #[error("refresh call failed: {0}")]
    Transport(TransportError),

    /// The refresh endpoint answered successfully with an unusable body.
    #[error("invalid refresh response: {message}")]
    InvalidResponse { message: String },

    /// The task driving the refresh was dropped before it settled.
    #[error("refresh abandoned before completion")]
    Abandoned,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
