//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use hite_core::engine::EngineConfig;
use hite_core::store::{KeyValueStore, MemoryStore};

use crate::file::JsonFileStore;

/// Which store backend to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// A JSON file that survives between runs.
    File {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    /// Process-local; everything is lost on exit.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./hite-store.json")
}

/// Top-level hite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiteConfig {
    /// Store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Question set used when none is given on the command line.
    #[serde(default)]
    pub question_set: Option<PathBuf>,
    /// How long an answer reveal shows before auto-advancing.
    #[serde(default = "default_advance_delay")]
    pub advance_delay_ms: u64,
    /// Completion points recorded at the end of a session.
    #[serde(default = "default_completed_points")]
    pub completed_points: u32,
    /// Streak points recorded at the end of a session.
    #[serde(default = "default_streak_points")]
    pub streak_points: u32,
    /// Score-board base that session points are added to.
    #[serde(default = "default_base_score")]
    pub base_score: u32,
    /// Streak length recorded when the score board is committed.
    #[serde(default = "default_streak_days")]
    pub streak_days: u32,
}

fn default_advance_delay() -> u64 {
    720
}
fn default_completed_points() -> u32 {
    100
}
fn default_streak_points() -> u32 {
    7
}
fn default_base_score() -> u32 {
    952
}
fn default_streak_days() -> u32 {
    6
}

impl Default for HiteConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            question_set: None,
            advance_delay_ms: default_advance_delay(),
            completed_points: default_completed_points(),
            streak_points: default_streak_points(),
            base_score: default_base_score(),
            streak_days: default_streak_days(),
        }
    }
}

impl HiteConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            advance_delay: Duration::from_millis(self.advance_delay_ms),
            completed_points: self.completed_points,
            streak_points: self.streak_points,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied through as-is; a `${...}` inside a value is
/// not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `hite.toml` in the current directory
/// 2. `~/.config/hite/config.toml`
///
/// Environment variable overrides: `HITE_STORE_PATH`, `HITE_QUESTION_SET`.
pub fn load_config_from(path: Option<&Path>) -> Result<HiteConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("hite.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<HiteConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => HiteConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut HiteConfig) {
    if let Ok(path) = std::env::var("HITE_STORE_PATH") {
        config.store = StoreConfig::File {
            path: PathBuf::from(path),
        };
    }
    if let Ok(path) = std::env::var("HITE_QUESTION_SET") {
        config.question_set = Some(PathBuf::from(path));
    }

    if let StoreConfig::File { path } = &mut config.store {
        *path = resolve_path(path);
    }
    if let Some(path) = &mut config.question_set {
        *path = resolve_path(path);
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("hite"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Arc<dyn KeyValueStore> {
    match config {
        StoreConfig::File { path } => {
            tracing::debug!("using file store at {}", path.display());
            Arc::new(JsonFileStore::open(path.clone()))
        }
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
    }
}
