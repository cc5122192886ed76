//! Config file loading.
//!
//! The config file is optional. Flags and environment variables win over
//! anything it says.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use retoken_core::{BaseUrl, ClientConfig};
use retoken_http::HttpConfig;

use crate::cli::GlobalOpts;

/// What a config file may contain. Everything is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<BaseUrl>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    #[serde(flatten)]
    client: ClientConfig,
}

/// The config file used when `--config` is not given.
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "retoken").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Resolve the HTTP config from the config file and the global flags.
pub fn load(opts: &GlobalOpts) -> Result<HttpConfig> {
    let file = match &opts.config {
        Some(path) => read_file_config(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "Using default config file");
                read_file_config(&path)?
            }
            None => FileConfig::default(),
        },
    };

    resolve(file, opts.api.as_deref())
}

fn resolve(file: FileConfig, api: Option<&str>) -> Result<HttpConfig> {
    let base_url = match api {
        Some(api) => BaseUrl::new(api).context("Invalid API base URL")?,
        None => match file.base_url {
            Some(url) => url,
            None => bail!("No API base URL. Pass --api, set RETOKEN_API, or set base_url in the config file."),
        },
    };

    let mut config = HttpConfig::new(base_url);
    if let Some(timeout) = file.timeout_secs {
        config.timeout_secs = timeout;
    }
    if let Some(user_agent) = file.user_agent {
        config.user_agent = user_agent;
    }
    config.client = file.client;

    Ok(config)
}
