//! Seams between the coordinator and its collaborators.

mod signal;
mod store;
mod transport;

pub use signal::SessionEndSignal;
pub use store::CredentialStore;
pub use transport::Transport;
