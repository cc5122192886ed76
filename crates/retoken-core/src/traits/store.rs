//! Credential store trait.

use crate::tokens::CredentialPair;

/// Holds the current credential pair.
///
/// Stores are accessed synchronously and are infallible at this boundary.
/// Implementations that persist the pair are expected to keep the in-memory
/// copy authoritative and report persistence failures through `tracing`.
pub trait CredentialStore: Send + Sync {
    /// Returns a snapshot of the current pair.
    fn get(&self) -> CredentialPair;

    /// Replaces the whole pair.
    fn set(&self, pair: CredentialPair);

    /// Removes both tokens.
    fn clear(&self);
}
