//! Refresh command implementation.

use anyhow::{Result, bail};
use clap::Args;

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(global: &GlobalOpts, _args: RefreshArgs) -> Result<()> {
    let client = super::connect(global)?;

    if client.credentials().refresh_token().is_none() {
        bail!("No active session. Run 'retoken login' first.");
    }

    output::progress("Refreshing tokens...");

    if let Err(e) = client.refresh().await {
        let hint = super::session_hint(&e);
        return Err(anyhow::Error::new(e).context(hint));
    }

    output::success("Tokens refreshed");
    Ok(())
}
