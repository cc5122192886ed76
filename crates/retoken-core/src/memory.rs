//! In-memory credential store.

use std::sync::{PoisonError, RwLock};

use crate::tokens::CredentialPair;
use crate::traits::CredentialStore;

/// A credential store that lives only as long as the process.
///
/// # Example
///
/// ```
/// use retoken_core::{AccessToken, CredentialPair, CredentialStore, MemoryCredentialStore};
///
/// let store = MemoryCredentialStore::new();
/// store.set(CredentialPair::new(Some(AccessToken::new("a")), None));
/// assert!(store.get().access_token().is_some());
/// store.clear();
/// assert!(store.get().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<CredentialPair>,
}

impl MemoryCredentialStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `pair`.
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: RwLock::new(pair),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> CredentialPair {
        self.pair
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, pair: CredentialPair) {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = pair;
    }

    fn clear(&self) {
        self.set(CredentialPair::empty());
    }
}
