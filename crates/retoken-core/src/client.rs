//! The authenticated API client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::coordinator::RefreshCoordinator;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::terminator::SessionTerminator;
use crate::tokens::{CredentialPair, TokenPairResponse};
use crate::traits::{CredentialStore, SessionEndSignal, Transport};

/// An API client that attaches credentials and recovers from expired access
/// tokens.
///
/// Clients are cheap to clone (they use internal `Arc`) and every clone shares
/// the same refresh state, so concurrent requests from any clone join the same
/// refresh.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use retoken_core::{AuthClient, ClientConfig, Credentials, MemoryCredentialStore, Request};
///
/// # async fn example(transport: Arc<dyn retoken_core::Transport>) -> retoken_core::Result<()> {
/// let client = AuthClient::new(
///     ClientConfig::default(),
///     Arc::new(MemoryCredentialStore::new()),
///     transport,
/// );
/// client.login(Credentials::new("alice@example.com", "hunter2")).await?;
///
/// let projects: serde_json::Value = client.send_json(Request::get("/projects")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    coordinator: Arc<RefreshCoordinator>,
}

/// Builder for [`AuthClient`].
pub struct AuthClientBuilder {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    signal: Option<Arc<dyn SessionEndSignal>>,
}

impl AuthClientBuilder {
    /// Notify `signal` when a failed refresh ends the session.
    pub fn on_session_end(mut self, signal: impl SessionEndSignal + 'static) -> Self {
        self.signal = Some(Arc::new(signal));
        self
    }

    pub fn build(self) -> AuthClient {
        let terminator = SessionTerminator::new(self.store.clone(), self.signal);
        let coordinator = Arc::new(RefreshCoordinator::new(
            self.store.clone(),
            self.transport.clone(),
            terminator,
            self.config.refresh.clone(),
            self.config.auth_failure.clone(),
        ));

        AuthClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                store: self.store,
                transport: self.transport,
                coordinator,
            }),
        }
    }
}

impl AuthClient {
    /// Start building a client.
    pub fn builder(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> AuthClientBuilder {
        AuthClientBuilder {
            config,
            store,
            transport,
            signal: None,
        }
    }

    /// A client with no session-end signal.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::builder(config, store, transport).build()
    }

    /// Send a request.
    ///
    /// Resolves with the response when its status is a success. If the access
    /// token was rejected, the token pair is refreshed (or an in-flight refresh
    /// is joined) and the request is replayed once.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] for any other non-success response
    /// - [`Error::RefreshFailed`] if the refresh failed; the session has ended
    /// - [`Error::RetryExhausted`] if the replay was rejected as well
    /// - [`Error::Transport`] if no response arrived
    pub async fn send(&self, request: Request) -> Result<Response, Error> {
        self.inner.coordinator.execute(request).await
    }

    /// Send a request and decode the JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, Error> {
        self.send(request).await?.json()
    }

    /// Exchange login credentials for a token pair and store it.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<(), Error> {
        info!("Logging in");

        let request = self.inner.config.login.request(credentials.login_body());
        let response = self.inner.transport.send(&request).await?;
        if !response.is_success() {
            return Err(Error::Protocol(response.to_protocol_error(&request)));
        }

        let tokens: TokenPairResponse = response.json()?;
        self.inner.store.set(tokens.into_pair(None));

        debug!("Login succeeded");
        Ok(())
    }

    /// Forget the stored credentials.
    ///
    /// Unlike a failed refresh, this does not notify the session-end signal.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        info!("Logging out");
        self.inner.store.clear();
    }

    /// Refresh the token pair now, joining an in-flight refresh if there is
    /// one.
    ///
    /// The refresh runs on its own task: cancelling this call does not cancel
    /// the refresh for anyone else waiting on it.
    ///
    /// A failed refresh ends the session exactly as it does for a rejected
    /// request.
    pub async fn refresh(&self) -> Result<(), Error> {
        self.inner
            .coordinator
            .fresh_credentials()
            .await
            .map_err(Error::RefreshFailed)
    }

    /// Snapshot of the stored credential pair.
    pub fn credentials(&self) -> CredentialPair {
        self.inner.store.get()
    }

    /// Returns true if an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.get().access_token().is_some()
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Number of requests waiting on the in-flight refresh.
    pub fn pending_replays(&self) -> usize {
        self.inner.coordinator.waiting()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

// Custom Debug impl that hides sensitive data
impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.inner.config)
            .field("coordinator", &self.inner.coordinator)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
