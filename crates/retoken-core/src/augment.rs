//! Attaches the access token to outbound requests.

use crate::request::Request;
use crate::tokens::CredentialPair;

/// Name of the header carrying the access token.
pub const AUTHORIZATION: &str = "authorization";

/// Returns `request` with a bearer authorization header for the pair's access
/// token, or unchanged when there is none.
///
/// Unauthenticated calls are legal, so a missing token is not an error here.
pub fn authorize(request: &Request, pair: &CredentialPair) -> Request {
    match pair.access_token() {
        Some(token) => request
            .clone()
            .with_header(AUTHORIZATION, format!("Bearer {}", token.as_str())),
        None => request.clone(),
    }
}
