//! Configuration System
//!
//! Loads tuning parameters from `tuning.toml`. Every field has a default, so a
//! partial file (or none at all) still produces a complete configuration.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::navigation::{BlacklistEntry, TeleportBlacklist};

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub residency: ResidencyConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// Simulation run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub ticks: u64,
    /// Ticks between registry saves (only written when dirty)
    pub save_interval: u64,
    pub players: usize,
    pub villagers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 6000,
            save_interval: 1200,
            players: 1,
            villagers: 12,
        }
    }
}

/// Residency controller cadence and radii
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidencyConfig {
    /// Ticks between building scans / home seeking
    pub building_scan_interval: u64,
    /// Ticks between residence validation and ledger sync
    pub validation_interval: u64,
    pub poi_scan_radius: i32,
    pub grave_scan_radius: f64,
    /// Extra distance beyond a settlement's border at which agents still find it
    pub village_discovery_margin: i32,
    pub go_home_speed: f32,
    pub go_home_completion_range: i32,
}

impl Default for ResidencyConfig {
    fn default() -> Self {
        Self {
            building_scan_interval: 600,
            validation_interval: 1200,
            poi_scan_radius: 48,
            grave_scan_radius: 24.0,
            village_discovery_margin: 32,
            go_home_speed: 0.6,
            go_home_completion_range: 1,
        }
    }
}

/// Navigation task limits and teleport assist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub allow_teleporting: bool,
    /// Targets at least this far away are teleported to instead of walked to
    pub teleport_limit: f64,
    /// Blocks (or `#tags`) an agent must never be teleported on top of
    pub pathfinding_blacklist: Vec<String>,
    pub max_replan_countdown: u32,
    pub min_run_time: u64,
    pub max_run_time: u64,
    pub teleport_attempts: u32,
    pub fallback_horizontal_range: i32,
    pub fallback_vertical_range: i32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            allow_teleporting: false,
            teleport_limit: 32.0,
            pathfinding_blacklist: vec![
                "minecraft:magma_block".to_string(),
                "minecraft:cactus".to_string(),
                "#minecraft:leaves".to_string(),
            ],
            max_replan_countdown: 40,
            min_run_time: 150,
            max_run_time: 250,
            teleport_attempts: 10,
            fallback_horizontal_range: 10,
            fallback_vertical_range: 7,
        }
    }
}

impl NavigationConfig {
    /// Parses the blacklist entries. Tags are not resolved here.
    pub fn blacklist(&self) -> Result<TeleportBlacklist, ConfigError> {
        self.pathfinding_blacklist
            .iter()
            .map(|raw| {
                raw.parse::<BlacklistEntry>()
                    .map_err(|e| ConfigError::InvalidBlacklistEntry(raw.clone(), e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TeleportBlacklist::new)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.navigation.blacklist()?;
        if self.residency.building_scan_interval == 0 || self.residency.validation_interval == 0 {
            return Err(ConfigError::Invalid("residency intervals must be positive".to_string()));
        }
        if self.navigation.min_run_time > self.navigation.max_run_time {
            return Err(ConfigError::Invalid(
                "navigation.min_run_time exceeds navigation.max_run_time".to_string(),
            ));
        }
        if self.navigation.fallback_horizontal_range < 0 || self.navigation.fallback_vertical_range < 0 {
            return Err(ConfigError::Invalid(
                "navigation fallback ranges must not be negative".to_string(),
            ));
        }
        if self.navigation.max_replan_countdown == 0 {
            return Err(ConfigError::Invalid(
                "navigation.max_replan_countdown must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid pathfinding blacklist entry '{0}': {1}")]
    InvalidBlacklistEntry(String, String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
