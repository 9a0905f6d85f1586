//! Application configuration
//!
//! Read from a JSON file; a missing file yields the defaults. Command line
//! flags override individual fields after loading.

use std::path::{Path, PathBuf};

use node_graph::GraphPolicy;
use procgraph_graph_store::ParameterKeying;
use procgraph_scene_sync::SyncOptions;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::defaults;

/// Full application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Node type catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// SQLite database for projections; in-memory when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Location used for `create_node` operations that omit one
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default)]
    pub graph: GraphPolicy,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub parameter_keying: ParameterKeying,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(defaults::CATALOG_FILE)
}

fn default_location() -> String {
    defaults::LOCATION.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            database_path: None,
            default_location: default_location(),
            graph: GraphPolicy::default(),
            sync: SyncOptions::default(),
            parameter_keying: ParameterKeying::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !fs::try_exists(path).await? {
            log::debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        let config = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;
        log::info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).await?;

        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}
