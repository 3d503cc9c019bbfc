//! Home-based storage paths for docket persistence.
//!
//! Everything lives under one home directory (default `~/.docket/`):
//! - `events.jsonl` - Shared event log for all cases
//! - `snapshots/<case-id>.json` - Per-case aggregate snapshots
//! - `docket.yaml` - Optional user configuration

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the docket directory inside the user's home.
const DOCKET_DIR: &str = ".docket";

/// Environment variable overriding the home directory.
pub const DOCKET_HOME_ENV: &str = "DOCKET_HOME";

/// Resolved on-disk layout for one docket home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocketPaths {
    home: PathBuf,
}

impl DocketPaths {
    /// Uses `home` as-is, creating it if needed.
    pub fn at(home: impl Into<PathBuf>) -> Result<Self> {
        let home = home.into();
        fs::create_dir_all(&home)
            .with_context(|| format!("Failed to create docket directory: {}", home.display()))?;
        Ok(Self { home })
    }

    /// Picks the home directory: explicit flag, then `DOCKET_HOME`, then the
    /// configured path, then `~/.docket`.
    pub fn resolve(flag: Option<&Path>, configured: Option<&Path>) -> Result<Self> {
        if let Some(home) = flag {
            return Self::at(home);
        }
        if let Some(home) = std::env::var_os(DOCKET_HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::at(PathBuf::from(home));
        }
        if let Some(home) = configured {
            return Self::at(home);
        }
        let user_home =
            dirs::home_dir().context("Could not determine home directory for docket storage")?;
        Self::at(user_home.join(DOCKET_DIR))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.home.join("events.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.home.join("snapshots")
    }

    /// User configuration file; may not exist.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("docket.yaml")
    }
}

#[cfg(test)]
#[path = "docket_paths_tests.rs"]
mod tests;
