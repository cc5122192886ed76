//! Session-end signal.

use crate::error::RefreshFailedError;

/// Notified when the session ends because a token refresh failed.
///
/// What "session ended" means (redirecting to a login page, exiting a CLI) is
/// up to the application. Any `Fn(&RefreshFailedError)` closure qualifies.
pub trait SessionEndSignal: Send + Sync {
    fn session_ended(&self, reason: &RefreshFailedError);
}

impl<F> SessionEndSignal for F
where
    F: Fn(&RefreshFailedError) + Send + Sync,
{
    fn session_ended(&self, reason: &RefreshFailedError) {
        self(reason)
    }
}
