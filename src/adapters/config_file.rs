//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on disk.
//! Missing fields take their defaults, so a file only needs the values
//! it changes.  Every load and save is validated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonFileConfig: {} not found, using defaults", self.path.display());
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("JsonFileConfig: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let config: SystemConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("JsonFileConfig: {} is not valid config: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("JsonFileConfig: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        std::fs::write(&self.path, text).map_err(|e| {
            warn!("JsonFileConfig: write {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("JsonFileConfig: saved {}", self.path.display());
        Ok(())
    }
}
