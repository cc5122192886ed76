//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod refresh;
pub mod request;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use retoken_core::{AuthClient, RefreshFailedError};

use crate::cli::{Cli, Commands, GlobalOpts};
use crate::config;
use crate::session::FileCredentialStore;

pub async fn handle(cli: Cli) -> Result<()> {
    let global = cli.global();
    match cli.command {
        Commands::Login(args) => login::run(&global, args).await,
        Commands::Logout(args) => logout::run(args),
        Commands::Status(args) => status::run(args),
        Commands::Refresh(args) => refresh::run(&global, args).await,
        Commands::Request(args) => request::run(&global, args).await,
    }
}

/// Build a client over the on-disk credential store.
fn connect(global: &GlobalOpts) -> Result<AuthClient> {
    let config = config::load(global)?;
    let store = FileCredentialStore::open_default().context("Failed to open credential store")?;

    let client = retoken_http::client_builder(&config, Arc::new(store))
        .context("Failed to create HTTP client")?
        .on_session_end(|reason: &RefreshFailedError| {
            warn!(reason = %reason, "Session ended, stored credentials removed");
        })
        .build();

    Ok(client)
}

/// Error context for operations that may end the session.
fn session_hint(err: &retoken_core::Error) -> &'static str {
    if err.refresh_failure().is_some() {
        "Session ended. Run 'retoken login' again."
    } else {
        "Request failed"
    }
}
