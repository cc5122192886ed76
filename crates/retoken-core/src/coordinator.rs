//! Single-flight token refresh and replay of rejected requests.
//!
//! A refresh episode starts when a request is rejected with an auth failure
//! and no refresh is in flight. The episode runs on its own task, so no
//! caller's cancellation can cut it short. The request that started it owns
//! the episode; every request rejected while it runs joins the wait queue.
//! When the refresh settles, the owner is released first, then the queue is
//! drained with the shared outcome before the `refreshing` flag is cleared,
//! and each caller replays its request once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use tracing::{Instrument, debug, info, instrument, warn};

use crate::augment::authorize;
use crate::config::EndpointConfig;
use crate::deferred::{Resolver, Waiter, deferred};
use crate::error::{Error, RefreshFailedError};
use crate::policy::{AuthFailurePolicy, Verdict};
use crate::queue::{RefreshOutcome, WaitQueue};
use crate::request::{Attempt, Request};
use crate::response::Response;
use crate::terminator::SessionTerminator;
use crate::tokens::{CredentialPair, TokenPairResponse};
use crate::traits::{CredentialStore, Transport};

pub(crate) struct RefreshCoordinator {
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    terminator: SessionTerminator,
    refresh: EndpointConfig,
    policy: AuthFailurePolicy,
    state: Mutex<RefreshState>,
}

/// Mutated only inside [`RefreshCoordinator::lock`], never across an await.
#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    queue: WaitQueue,
}

type OutcomeResolver = Resolver<(), Arc<RefreshFailedError>>;
type OutcomeWaiter = Waiter<(), Arc<RefreshFailedError>>;

enum Role {
    Owner,
    Waiter(OutcomeWaiter),
}

impl RefreshCoordinator {
    pub(crate) fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
        terminator: SessionTerminator,
        refresh: EndpointConfig,
        policy: AuthFailurePolicy,
    ) -> Self {
        let policy = policy.excluding(refresh.path.clone());
        Self {
            store,
            transport,
            terminator,
            refresh,
            policy,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Send `request`, recovering once from an expired access token.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.route()))]
    pub(crate) async fn execute(self: &Arc<Self>, request: Request) -> Result<Response, Error> {
        let attempt = Attempt::new(request);
        let response = self.dispatch(&attempt).await?;

        match self.policy.classify(&attempt, &response) {
            Verdict::AuthExpired => {}
            verdict => return verdict.into_result(&attempt, response),
        }

        debug!(status = response.status(), "Access token rejected");
        let replay = attempt.into_replay();
        self.fresh_credentials().await.map_err(Error::RefreshFailed)?;

        debug!("Replaying request with refreshed token");
        let response = self.dispatch(&replay).await?;
        self.policy
            .classify(&replay, &response)
            .into_result(&replay, response)
    }

    /// Wait for fresh credentials: start a refresh episode, or join the one
    /// in flight.
    ///
    /// Dropping the returned future only gives up this caller's wait. The
    /// episode keeps running and every other caller still receives its outcome.
    /// Must be called within a tokio runtime.
    pub(crate) async fn fresh_credentials(self: &Arc<Self>) -> RefreshOutcome {
        let role = {
            let mut state = self.lock();
            if state.refreshing {
                Role::Waiter(state.queue.enqueue())
            } else {
                state.refreshing = true;
                Role::Owner
            }
        };

        let waiter = match role {
            Role::Owner => {
                let (owner, waiter) = deferred();
                let episode = Episode::begin(self.clone(), owner);
                tokio::spawn(self.clone().run_episode(episode).in_current_span());
                waiter
            }
            Role::Waiter(waiter) => {
                debug!("Refresh in flight, waiting");
                waiter
            }
        };

        waiter
            .wait()
            .await
            .unwrap_or_else(|_| Err(Arc::new(RefreshFailedError::Abandoned)))
    }

    /// Returns true while a refresh episode is in flight.
    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of callers waiting on the in-flight refresh.
    pub(crate) fn waiting(&self) -> usize {
        self.lock().queue.len()
    }

    async fn dispatch(&self, attempt: &Attempt) -> Result<Response, Error> {
        let request = authorize(attempt.request(), &self.store.get());
        Ok(self.transport.send(&request).await?)
    }

    #[instrument(skip(self, episode))]
    async fn run_episode(self: Arc<Self>, episode: Episode) {
        match self.call_refresh().await {
            Ok(pair) => {
                self.store.set(pair);
                let released = episode.settle(Ok(()));
                info!(released, "Token refresh succeeded");
            }
            Err(err) => {
                let shared = Arc::new(err);
                let released = episode.settle(Err(shared.clone()));
                warn!(error = %shared, released, "Token refresh failed, ending session");
                self.terminator.terminate(&shared);
            }
        }
    }

    async fn call_refresh(&self) -> Result<CredentialPair, RefreshFailedError> {
        let current = self.store.get();
        let refresh_token = current
            .refresh_token()
            .cloned()
            .ok_or(RefreshFailedError::MissingRefreshToken)?;

        let request = self
            .refresh
            .request(json!({ "refreshToken": refresh_token.as_str() }));
        debug!(path = %request.route(), "Calling refresh endpoint");

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(RefreshFailedError::Transport)?;

        if !response.is_success() {
            return Err(RefreshFailedError::Rejected(
                response.to_protocol_error(&request),
            ));
        }

        let body: TokenPairResponse =
            response
                .json()
                .map_err(|e| RefreshFailedError::InvalidResponse {
                    message: e.to_string(),
                })?;

        Ok(body.into_pair(Some(&refresh_token)))
    }

    /// Release the owner, drain the queue with `outcome`, then clear the flag.
    ///
    /// Returns how many queued callers were still waiting.
    fn settle(&self, owner: OutcomeResolver, outcome: &RefreshOutcome) -> usize {
        let mut state = self.lock();
        if !owner.settle(outcome.clone()) {
            debug!("Refresh owner stopped waiting");
        }
        let released = state.queue.drain(outcome);
        state.refreshing = false;
        released
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running refresh episode.
///
/// Lives on the episode task. If that task is torn down before the refresh
/// settles (runtime shutdown, a panicking store), the episode is settled as
/// abandoned so waiters are released and a later failure can start a new
/// refresh.
struct Episode {
    coordinator: Arc<RefreshCoordinator>,
    owner: Option<OutcomeResolver>,
}

impl Episode {
    fn begin(coordinator: Arc<RefreshCoordinator>, owner: OutcomeResolver) -> Self {
        Self {
            coordinator,
            owner: Some(owner),
        }
    }

    fn settle(mut self, outcome: RefreshOutcome) -> usize {
        match self.owner.take() {
            Some(owner) => self.coordinator.settle(owner, &outcome),
            None => 0,
        }
    }
}

impl Drop for Episode {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.take() {
            let released = self
                .coordinator
                .settle(owner, &Err(Arc::new(RefreshFailedError::Abandoned)));
            warn!(released, "Token refresh abandoned");
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh", &self.refresh)
            .field("policy", &self.policy)
            .field("state", &*self.lock())
            .finish()
    }
}
