//! retoken-core - Credential attachment and single-flight token refresh.
//!
//! All authenticated calls flow through an [`AuthClient`]. It attaches the
//! current access token to each request, and when the API answers with an
//! authentication failure it refreshes the token pair exactly once for every
//! burst of concurrent failures, then replays the affected requests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use retoken_core::{AuthClient, ClientConfig, MemoryCredentialStore, Request};
//!
//! # async fn example(transport: Arc<dyn retoken_core::Transport>) -> retoken_core::Result<()> {
//! let store = Arc::new(MemoryCredentialStore::new());
//! let client = AuthClient::builder(ClientConfig::default(), store, transport)
//!     .on_session_end(|reason: &retoken_core::RefreshFailedError| {
//!         eprintln!("signed out: {reason}");
//!     })
//!     .build();
//!
//! let response = client.send(Request::get("/projects")).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod augment;
pub mod client;
pub mod config;
pub mod credentials;
pub mod deferred;
pub mod error;
pub mod memory;
pub mod policy;
pub mod queue;
pub mod request;
pub mod response;
pub mod terminator;
pub mod tokens;
pub mod traits;
pub mod types;

mod coordinator;

pub use augment::authorize;
pub use client::{AuthClient, AuthClientBuilder};
pub use config::{ClientConfig, EndpointConfig};
pub use credentials::Credentials;
pub use error::{
    Error, InvalidInputError, ProtocolError, RefreshFailedError, TransportError,
};
pub use memory::MemoryCredentialStore;
pub use policy::{AuthFailurePolicy, Verdict};
pub use request::{Attempt, Method, Request};
pub use response::Response;
pub use terminator::SessionTerminator;
pub use tokens::{AccessToken, CredentialPair, RefreshToken, TokenPairResponse};
pub use traits::{CredentialStore, SessionEndSignal, Transport};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
