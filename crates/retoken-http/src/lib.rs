//! retoken-http - reqwest-backed transport for retoken.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use retoken_core::{BaseUrl, MemoryCredentialStore, Request};
//! use retoken_http::HttpConfig;
//!
//! # async fn example() -> retoken_core::Result<()> {
//! let config = HttpConfig::new(BaseUrl::new("https://api.example.com")?);
//! let client = retoken_http::client_builder(&config, Arc::new(MemoryCredentialStore::new()))?
//!     .build();
//!
//! let response = client.send(Request::get("/projects")).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod transport;

use std::sync::Arc;

use retoken_core::{AuthClient, AuthClientBuilder, CredentialStore, Error};

pub use config::HttpConfig;
pub use transport::ReqwestTransport;

/// Start building an [`AuthClient`] that talks HTTP according to `config`.
pub fn client_builder(
    config: &HttpConfig,
    store: Arc<dyn CredentialStore>,
) -> Result<AuthClientBuilder, Error> {
    let transport = ReqwestTransport::from_config(config)?;
    Ok(AuthClient::builder(
        config.client.clone(),
        store,
        Arc::new(transport),
    ))
}
