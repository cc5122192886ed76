//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use retoken_core::Credentials;

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "RETOKEN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(global: &GlobalOpts, args: LoginArgs) -> Result<()> {
    let client = super::connect(global)?;

    output::progress("Logging in...");

    client
        .login(Credentials::new(&args.email, &args.password))
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    output::field("Email", &args.email);

    Ok(())
}
