use crate::domain::access::{Actor, Role};
use crate::domain::services::WorkflowPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocketConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub workflow: WorkflowPolicy,
    /// Known callers and their global roles, keyed by user id.
    #[serde(default)]
    pub users: BTreeMap<String, UserConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Docket home. `--home` and `DOCKET_HOME` take precedence.
    #[serde(default)]
    pub home: Option<PathBuf>,
    /// Snapshot a case after this many events; 0 disables snapshots. Default: 25
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            home: None,
            snapshot_every: default_snapshot_every(),
        }
    }
}

fn default_snapshot_every() -> u64 {
    25
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub role: String,
}

impl DocketConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Loads `path` when it exists, otherwise the embedded defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::default_config()
        }
    }

    pub fn default_config() -> Result<Self> {
        const DEFAULT_DOCKET_YAML: &str = include_str!("../docket.yaml");

        Self::parse(DEFAULT_DOCKET_YAML).context("Failed to parse embedded docket.yaml")
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse config as YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (id, user) in &self.users {
            if id.trim().is_empty() {
                anyhow::bail!("User ids must not be empty");
            }
            user.role
                .parse::<Role>()
                .map_err(|e| anyhow::anyhow!("User '{}': {}", id, e))?;
        }

        Ok(())
    }

    /// Resolves a configured user id to a verified caller.
    pub fn identity(&self, user: &str) -> Result<Actor> {
        let Some(entry) = self.users.get(user) else {
            anyhow::bail!("Unknown user '{}'; add it under `users` in docket.yaml", user);
        };
        let role = entry
            .role
            .parse::<Role>()
            .map_err(|e| anyhow::anyhow!("User '{}': {}", user, e))?;
        Ok(Actor::new(user, role))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
