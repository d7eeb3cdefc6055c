//! Scanner configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::capture::CameraPosition;

/// Bounds on the automatic restart of a failed capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    /// Restart attempts allowed between re-initializations.
    pub max_attempts: u32,
    /// Delay before each restart attempt, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 200,
        }
    }
}

impl RestartPolicy {
    /// Returns the restart delay as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Behavior of a mounted scanner view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Which camera the view opens at mount.
    pub position: CameraPosition,
    /// Automatic restart behavior after pipeline runtime errors.
    pub restart: RestartPolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            position: CameraPosition::Back,
            restart: RestartPolicy::default(),
        }
    }
}

impl ScannerConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restart.delay_ms == 0 || self.restart.delay_ms > 60_000 {
            return Err(ConfigError::InvalidRestartDelay);
        }
        Ok(())
    }
}

/// Demo driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Run until interrupted (true) or emit a fixed number of scans.
    pub continuous: bool,
    /// Number of synthetic scans when not continuous.
    pub scan_count: u32,
    /// Milliseconds between synthetic scans.
    pub scan_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            scan_count: 4,
            scan_interval_ms: 250,
        }
    }
}

impl DemoConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.continuous && self.scan_count == 0 {
            return Err(ConfigError::InvalidScanCount);
        }
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::InvalidScanInterval);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid restart delay (must be 1-60000 ms)")]
    InvalidRestartDelay,
    #[error("invalid scan count (must be nonzero for a bounded run)")]
    InvalidScanCount,
    #[error("invalid scan interval (must be nonzero)")]
    InvalidScanInterval,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.scanner.validate()?;
        config.demo.validate()?;
        Ok(config)
    }
}
