//! Model configuration

use crate::{
    error::{LendingError, LendingResult},
    math::DEFAULT_RECENT_SLOT_DURATION_MS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the path of the configuration file
pub const CONFIG_PATH_ENV: &str = "KLEND_SDK_CONFIG";

/// Settings shared by every reserve loaded from one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    /// Measured slot time used to turn per-slot rates into yearly ones
    pub recent_slot_duration_ms: u64,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            recent_slot_duration_ms: DEFAULT_RECENT_SLOT_DURATION_MS,
        }
    }
}

impl LendingConfig {
    /// Parse configuration from TOML, missing keys take their defaults
    pub fn from_toml_str(source: &str) -> LendingResult<Self> {
        let config: LendingConfig = toml::from_str(source)
            .map_err(|err| LendingError::InvalidConfig(format!("Failed to parse config TOML: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> LendingResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            LendingError::InvalidConfig(format!(
                "Failed to read config file {}: {}",
                path.display(),
                err
            ))
        })?;
        let config = Self::from_toml_str(&source)?;
        log::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Load configuration from the file named by `KLEND_SDK_CONFIG`, defaults when unset
    pub fn load_from_env() -> LendingResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Serialize configuration to TOML
    pub fn to_toml_string(&self) -> LendingResult<String> {
        toml::to_string_pretty(self)
            .map_err(|err| LendingError::InvalidConfig(format!("Failed to serialize config: {}", err)))
    }

    /// Check that values are usable
    pub fn validate(&self) -> LendingResult<()> {
        if self.recent_slot_duration_ms == 0 {
            return Err(LendingError::InvalidConfig(
                "recent_slot_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LendingConfig::default();
        assert_eq!(config.recent_slot_duration_ms, 450);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let config = LendingConfig::from_toml_str("recent_slot_duration_ms = 500").unwrap();
        assert_eq!(config.recent_slot_duration_ms, 500);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = LendingConfig::from_toml_str("").unwrap();
        assert_eq!(config, LendingConfig::default());
    }

    #[test]
    fn test_zero_slot_duration_rejected() {
        let result = LendingConfig::from_toml_str("recent_slot_duration_ms = 0");
        assert!(matches!(result, Err(LendingError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LendingConfig {
            recent_slot_duration_ms: 420,
        };
        let source = config.to_toml_string().unwrap();
        assert_eq!(LendingConfig::from_toml_str(&source).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = LendingConfig::load("/nonexistent/klend-sdk.toml");
        assert!(matches!(result, Err(LendingError::InvalidConfig(_))));
    }
}
