//! Docview CLI configuration
//!
//! Loaded from a TOML file with a `[transfer]` and a `[radio]` table. Missing
//! tables and keys fall back to defaults; command-line flags override both.

use std::path::Path;

use docview_ble::SimulatedRadioConfig;
use docview_core::TransferConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Transfer pacing, retries and timeout
    pub transfer: TransferConfig,

    /// Simulated radio behaviour
    pub radio: SimulatedRadioConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check both tables
    pub fn validate(&self) -> Result<()> {
        self.transfer
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        self.radio.validate()?;
        Ok(())
    }
}
