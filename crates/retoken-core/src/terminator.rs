//! Ends the session after an unrecoverable refresh failure.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::RefreshFailedError;
use crate::traits::{CredentialStore, SessionEndSignal};

/// Clears the credential store and tells the application the session ended.
///
/// Terminating twice leaves the store in the same (empty) state; the signal
/// is invoked on each call, and the coordinator calls it once per failed
/// refresh episode.
#[derive(Clone)]
pub struct SessionTerminator {
    store: Arc<dyn CredentialStore>,
    signal: Option<Arc<dyn SessionEndSignal>>,
}

impl SessionTerminator {
    pub fn new(store: Arc<dyn CredentialStore>, signal: Option<Arc<dyn SessionEndSignal>>) -> Self {
        Self { store, signal }
    }

    #[instrument(skip(self))]
    pub fn terminate(&self, reason: &RefreshFailedError) {
        info!("Ending session");
        self.store.clear();
        if let Some(signal) = &self.signal {
            signal.session_ended(reason);
        }
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("signal", &self.signal.is_some())
            .finish()
    }
}
