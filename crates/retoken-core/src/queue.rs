//! FIFO queue of callers blocked on an in-flight refresh.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::deferred::{Resolver, Waiter, deferred};
use crate::error::RefreshFailedError;

/// Outcome every queued caller receives when a refresh settles.
pub type RefreshOutcome = Result<(), Arc<RefreshFailedError>>;

/// Pending callers in arrival order.
///
/// The queue is only ever drained as a whole: every pending caller receives
/// the same outcome, in the order they were enqueued.
#[derive(Debug, Default)]
pub struct WaitQueue {
    pending: VecDeque<Resolver<(), Arc<RefreshFailedError>>>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a new pending caller and return its waiter.
    pub fn enqueue(&mut self) -> Waiter<(), Arc<RefreshFailedError>> {
        let (resolver, waiter) = deferred();
        self.pending.push_back(resolver);
        waiter
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Settle every pending caller with `outcome`, front to back, and leave
    /// the queue empty. Returns how many callers were still waiting.
    pub fn drain(&mut self, outcome: &RefreshOutcome) -> usize {
        let mut delivered = 0;
        for resolver in self.pending.drain(..) {
            if resolver.settle(outcome.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}
