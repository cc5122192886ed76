#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use tempfile::TempDir;
use tokio::process::Command;

/// An isolated home directory for one test.
pub struct Sandbox {
    pub home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    pub fn path(&self) -> &Path {
        self.home.path()
    }

    /// Where the CLI keeps credentials under this sandbox.
    pub fn credentials_path(&self) -> PathBuf {
        self.path().join("data").join("retoken").join("credentials.json")
    }

    pub fn stored(&self) -> Option<serde_json::Value> {
        let text = std::fs::read_to_string(self.credentials_path()).ok()?;
        Some(serde_json::from_str(&text).expect("Invalid credentials file"))
    }

    /// Seed the credentials file directly.
    pub fn seed(&self, access: &str, refresh: &str) {
        let path = self.credentials_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let body = serde_json::json!({
            "access_token": access,
            "refresh_token": refresh,
            "updated_at": "2026-01-01T00:00:00Z",
        });
        std::fs::write(path, body.to_string()).unwrap();
    }

    /// Run the CLI binary with this sandbox as HOME and `api` as the base URL.
    pub async fn run(&self, args: &[&str], api: Option<&str>) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_retoken"));
        cmd.args(args);
        cmd.env("HOME", self.path());
        cmd.env("XDG_DATA_HOME", self.path().join("data"));
        cmd.env("XDG_CONFIG_HOME", self.path().join("config"));
        cmd.env_remove("RETOKEN_CONFIG");
        cmd.env_remove("RETOKEN_PASSWORD");
        cmd.env_remove("RUST_LOG");
        match api {
            Some(api) => cmd.env("RETOKEN_API", api),
            None => cmd.env_remove("RETOKEN_API"),
        };
        cmd.output().await.expect("Failed to execute CLI")
    }

    /// Run the CLI and expect success.
    pub async fn run_success(&self, args: &[&str], api: Option<&str>) -> String {
        let output = self.run(args, api).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure, returning stderr.
    pub async fn run_failure(&self, args: &[&str], api: Option<&str>) -> String {
        let output = self.run(args, api).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
