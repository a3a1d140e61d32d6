//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit config file, replaces the file tiers.
pub const ENV_CONFIG_PATH: &str = "TASK_TRACKER_CONFIG_PATH";
const ENV_DB_PATH: &str = "TASK_TRACKER_DB_PATH";
const ENV_PORT: &str = "TASK_TRACKER_PORT";
const ENV_BIND_ADDRESS: &str = "TASK_TRACKER_BIND_ADDRESS";
const ENV_USER_DIR: &str = "TASK_TRACKER_USER_DIR";
const ENV_PROJECT_DIR: &str = "TASK_TRACKER_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/task-tracker/)
    Project = 1,
    /// User-level config (~/.task-tracker/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: TASK_TRACKER_USER_DIR or ~/.task-tracker
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-tracker")));

        // Project dir: TASK_TRACKER_PROJECT_DIR or $CWD/task-tracker
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-tracker")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    /// Config file for a tier, if that tier has a directory.
    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Defaults | ConfigTier::Environment => None,
        };
        dir.map(|d| d.join(CONFIG_FILE))
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // Explicit config path replaces the file tiers
        if let Ok(explicit_path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(&explicit_path);
            let mut config = Config::load(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            Self::apply_env_overrides(&mut config)?;
            return Ok(Self {
                config,
                sources: vec![path],
            });
        }

        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        // Tiers 2 and 3: Project then user config
        for tier in [ConfigTier::Project, ConfigTier::User] {
            let Some(config_file) = paths.config_file(tier) else {
                continue;
            };
            if let Some(value) = Self::read_yaml(&config_file) {
                debug!(tier = %tier, path = %config_file.display(), "Loaded config tier");
                configs.push(value);
                sources.push(config_file);
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config)?;

        Ok(Self { config, sources })
    }

    /// Read a YAML file as a JSON value. Missing or unparsable files are skipped.
    fn read_yaml(path: &Path) -> Option<Value> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_yaml::from_str::<Value>(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) -> Result<()> {
        if let Ok(db_path) = std::env::var(ENV_DB_PATH) {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(port) = std::env::var(ENV_PORT) {
            config.server.port = port
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: {port}"))?;
        }

        if let Ok(bind) = std::env::var(ENV_BIND_ADDRESS) {
            config.server.bind_address = bind
                .parse()
                .with_context(|| format!("{ENV_BIND_ADDRESS} is not an IP address: {bind}"))?;
        }

        Ok(())
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest priority first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
