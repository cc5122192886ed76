//! File-backed credential store.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use retoken_core::{AccessToken, CredentialPair, CredentialStore, RefreshToken};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Credentials as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCredentials {
    fn from_pair(pair: &CredentialPair) -> Self {
        Self {
            access_token: pair.access_token().map(|t| t.as_str().to_string()),
            refresh_token: pair.refresh_token().map(|t| t.as_str().to_string()),
            updated_at: Utc::now(),
        }
    }

    fn to_pair(&self) -> CredentialPair {
        CredentialPair::new(
            self.access_token.clone().map(AccessToken::new),
            self.refresh_token.clone().map(RefreshToken::new),
        )
    }
}

/// Get the default credentials file path.
pub fn default_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "retoken").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}

/// A credential store that writes through to a JSON file.
///
/// The in-memory copy is authoritative for the life of the process. Writes
/// are persisted under an exclusive lock on a sibling lock file; a failed
/// write is logged and does not affect the in-memory pair.
///
/// Persistence is blocking: `set` and `clear` take the file lock, write,
/// fsync and rename on the calling thread. The refresh coordinator calls
/// `set` from its episode task, so a slow disk stalls a runtime worker for
/// the length of the write. That is fine for a CLI issuing a handful of
/// requests; a long-running service should put a non-blocking store in
/// front of the file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    pair: RwLock<CredentialPair>,
}

impl FileCredentialStore {
    /// Open the store at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    /// Open the store at `path`, loading whatever is already there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pair = match read_stored(&path)? {
            Some(stored) => stored.to_pair(),
            None => CredentialPair::empty(),
        };

        Ok(Self {
            path,
            pair: RwLock::new(pair),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file as it is on disk now.
    pub fn stored(&self) -> Result<Option<StoredCredentials>> {
        read_stored(&self.path)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn persist(&self, pair: &CredentialPair) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let result = if pair.is_empty() {
            match fs::remove_file(&self.path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        } else {
            self.write_file(&StoredCredentials::from_pair(pair))
        };

        lock_file.unlock()?;
        result
    }

    fn write_file(&self, stored: &StoredCredentials) -> io::Result<()> {
        let json = serde_json::to_string_pretty(stored)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_data()?;
        drop(file);

        fs::rename(&tmp, &self.path)
    }

    fn replace(&self, pair: CredentialPair) {
        if let Err(e) = self.persist(&pair) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist credentials");
        } else {
            debug!(path = %self.path.display(), "Credentials persisted");
        }
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = pair;
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> CredentialPair {
        self.pair
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, pair: CredentialPair) {
        self.replace(pair);
    }

    fn clear(&self) {
        self.replace(CredentialPair::empty());
    }
}

fn read_stored(path: &Path) -> Result<Option<StoredCredentials>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path).context("Failed to read credentials file")?;
    let stored = serde_json::from_str(&json).context("Invalid credentials file")?;
    Ok(Some(stored))
}
