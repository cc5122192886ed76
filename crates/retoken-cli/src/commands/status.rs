//! Status command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::output;
use crate::session::FileCredentialStore;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let store = FileCredentialStore::open_default().context("Failed to open credential store")?;
    let stored = store.stored().context("Failed to read credentials")?;

    if args.json {
        let value = match &stored {
            Some(s) => json!({
                "logged_in": s.access_token.is_some(),
                "access_token": s.access_token.is_some(),
                "refresh_token": s.refresh_token.is_some(),
                "updated_at": s.updated_at,
                "path": store.path(),
            }),
            None => json!({ "logged_in": false, "path": store.path() }),
        };
        return output::json_pretty(&value);
    }

    let Some(stored) = stored else {
        output::field("Status", "not logged in");
        return Ok(());
    };

    output::field("Status", "logged in");
    output::field("Access token", &output::presence(stored.access_token.is_some()));
    output::field(
        "Refresh token",
        &output::presence(stored.refresh_token.is_some()),
    );
    output::field("Updated", &stored.updated_at.to_rfc3339());
    output::field("File", &store.path().display().to_string());

    Ok(())
}
