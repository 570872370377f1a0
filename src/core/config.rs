//! Simulation configuration with documented constants
//!
//! All tunable numbers of the auto-resolver are collected here. A config is
//! usually loaded from TOML; any field missing from the file keeps its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimulationError};

/// Configuration for a single auto-resolved battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === BATTLE LENGTH ===
    /// Rounds after which the battle is called off undecided
    pub max_rounds: u32,

    /// Seed for the dice source. The same seed and scenario replay the
    /// same battle, report for report.
    pub seed: u64,

    // === BOARD ===
    /// Board width in hexes. Column 0 and column `board_width - 1` are the
    /// edges a withdrawing formation leaves through.
    pub board_width: u32,

    /// Board height in hexes
    pub board_height: u32,

    // === RANGE BANDS ===
    /// Furthest distance (hexes) that still counts as short range
    pub short_range: u32,

    /// Furthest distance that still counts as medium range
    pub medium_range: u32,

    /// Furthest distance that still counts as long range. Anything beyond is
    /// extreme range, which standard attacks cannot use.
    pub long_range: u32,

    // === TARGET NUMBERS ===
    /// Base 2d6 target for a morale check, before skill and ladder modifiers
    pub base_morale_target: i32,

    /// Base 2d6 target for recovering nerve
    ///
    /// Morale improves when this roll FAILS, so a higher target makes
    /// recovery more likely.
    pub base_recovery_target: i32,

    /// Added to attack target numbers against a formation that moved to cover
    pub cover_modifier: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            seed: 0,

            board_width: 30,
            board_height: 1,

            short_range: 3,
            medium_range: 9,
            long_range: 15,

            base_morale_target: 4,
            base_recovery_target: 6,
            cover_modifier: 1,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.board_width == 0 || self.board_height == 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "board must not be empty ({}x{})",
                self.board_width, self.board_height
            )));
        }

        if self.max_rounds == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_rounds must be positive".into(),
            ));
        }

        // Range bands must be ordered
        if !(self.short_range < self.medium_range && self.medium_range < self.long_range) {
            return Err(SimulationError::InvalidConfig(format!(
                "range bands must ascend: short {} < medium {} < long {}",
                self.short_range, self.medium_range, self.long_range
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str("max_rounds = 7\nseed = 99\n").unwrap();
        assert_eq!(config.max_rounds, 7);
        assert_eq!(config.seed, 99);
        assert_eq!(config.board_width, SimulationConfig::default().board_width);
    }

    #[test]
    fn test_unordered_range_bands_rejected() {
        let result = SimulationConfig::from_toml_str("short_range = 10\nmedium_range = 5\n");
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_board_rejected() {
        let config = SimulationConfig {
            board_width: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = SimulationConfig::from_toml_str("max_rounds = \"lots\"");
        assert!(matches!(result, Err(SimulationError::ConfigParse(_))));
    }
}
