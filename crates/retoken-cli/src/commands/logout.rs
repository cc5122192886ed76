//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use retoken_core::CredentialStore;

use crate::output;
use crate::session::FileCredentialStore;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs) -> Result<()> {
    let store = FileCredentialStore::open_default().context("Failed to open credential store")?;

    if store.get().is_empty() {
        output::warning("Not logged in");
        return Ok(());
    }

    store.clear();
    if store.path().exists() {
        anyhow::bail!("Failed to remove {}", store.path().display());
    }

    output::success("Logged out");
    Ok(())
}
