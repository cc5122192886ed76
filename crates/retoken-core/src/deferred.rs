//! A one-shot deferred value with separate settle and wait halves.
//!
//! [`deferred`] returns a [`Resolver`] that settles the value exactly once and
//! a [`Waiter`] that awaits it. The halves can live in different places: the
//! refresh coordinator keeps resolvers in its wait queue while each blocked
//! caller holds its waiter.

use thiserror::Error;
use tokio::sync::oneshot;

/// The resolver was dropped without settling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deferred value dropped before it was settled")]
pub struct Unsettled;

/// Settles a deferred value.
#[derive(Debug)]
pub struct Resolver<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

/// Awaits a deferred value.
#[derive(Debug)]
pub struct Waiter<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

/// Create a linked resolver/waiter pair.
pub fn deferred<T, E>() -> (Resolver<T, E>, Waiter<T, E>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Waiter { rx })
}

impl<T, E> Resolver<T, E> {
    /// Settle with a value. Returns false if the waiter is gone.
    pub fn resolve(self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns false if the waiter is gone.
    pub fn reject(self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settle with a result. Returns false if the waiter is gone.
    pub fn settle(self, outcome: Result<T, E>) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Returns true if the waiter has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T, E> Waiter<T, E> {
    /// Wait for the resolver to settle.
    pub async fn wait(self) -> Result<Result<T, E>, Unsettled> {
        self.rx.await.map_err(|_| Unsettled)
    }
}
