//! Engine configuration.
//!
//! The numeric contracts that are product decisions rather than code live
//! here so they can be tuned without a release: K-factor, initial-score
//! mapping, reward cadence, ranking weights, and tier thresholds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::matches::{EloConfig, RewardConfig};
use crate::points::NamedTiers;
use crate::ranking::RankingConfig;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Data directory (derived at load time, not persisted).
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// ELO constants.
    pub elo: EloConfig,
    /// Match reward cadence and level sizing.
    pub rewards: RewardConfig,
    /// Composite ranking weights and windows.
    pub ranking: RankingConfig,
    /// Named tier thresholds for reward eligibility.
    pub tiers: NamedTiers,
}

impl EngineConfig {
    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("burgerrank.db")
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "burgerrank", "BurgerRank")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load engine configuration from file.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    let path = get_config_path();

    if !path.exists() {
        let config = EngineConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: EngineConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();

    Ok(config)
}

/// Save engine configuration to file.
pub fn save_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let path = get_config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
