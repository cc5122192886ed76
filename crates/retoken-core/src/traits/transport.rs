//! Transport trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::Request;
use crate::response::Response;

/// Performs a single outbound call.
///
/// Every HTTP response, whatever its status, resolves to `Ok`; only failures
/// that produced no response (connection, timeout) are errors. The
/// coordinator classifies statuses itself.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once, honouring its timeout if set.
    async fn send(&self, request: &Request) -> Result<Response, TransportError>;
}
