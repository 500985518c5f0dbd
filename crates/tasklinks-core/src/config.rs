use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project config location relative to the project root.
pub const CONFIG_RELATIVE_PATH: &str = ".tasklinks/config.toml";
/// Environment variable overriding `storage.path`.
pub const DB_PATH_ENV: &str = "TASKLINKS_DB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StorageConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Publish `tasklink.delete` for both rows when a pair is removed.
    #[serde(default)]
    pub publish_on_remove: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    /// Absolute (or root-relative) database path after env override.
    pub db_path: PathBuf,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(CONFIG_RELATIVE_PATH);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let env_path = env::var(DB_PATH_ENV).ok();
    let db_path = resolve_db_path(project_root, &project.storage, env_path);

    Ok(EffectiveConfig { project, db_path })
}

fn resolve_db_path(
    project_root: &Path,
    storage: &StorageConfig,
    env_path: Option<String>,
) -> PathBuf {
    let raw = env_path
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| storage.path.clone(), PathBuf::from);

    if raw.is_absolute() {
        raw
    } else {
        project_root.join(raw)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".tasklinks/links.sqlite3")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}
