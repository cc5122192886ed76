//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{login, logout, refresh, request, status};

/// Call token-authenticated APIs, refreshing expired tokens on the way.
#[derive(Parser, Debug)]
#[command(name = "retoken")]
#[command(author, version = env!("RETOKEN_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path to a TOML config file
    #[arg(long, global = true, env = "RETOKEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL, overriding the config file
    #[arg(long, global = true, env = "RETOKEN_API")]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the issued token pair
    Login(login::LoginArgs),

    /// Forget the stored token pair
    Logout(logout::LogoutArgs),

    /// Show what is stored
    Status(status::StatusArgs),

    /// Refresh the stored token pair now
    Refresh(refresh::RefreshArgs),

    /// Send an authenticated request
    Request(request::RequestArgs),
}

/// Options every API-facing command needs.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub api: Option<String>,
}

impl Cli {
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            config: self.config.clone(),
            api: self.api.clone(),
        }
    }
}
