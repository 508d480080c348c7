//! Configuration types for the terminal session bridge.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Geometry};

/// Bridge configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Terminal settings
    pub terminal: TerminalSettings,
    /// Registry settings
    pub registry: RegistrySettings,
    /// Setup operation settings
    pub setup: SetupSettings,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl BridgeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: BridgeConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.registry.max_sessions == 0 {
            return Err(Error::Config(
                "registry.max_sessions must be > 0".to_string(),
            ));
        }

        if self.terminal.default_cols == 0 || self.terminal.default_rows == 0 {
            return Err(Error::Config(
                "terminal dimensions must be > 0".to_string(),
            ));
        }

        if self.setup.poll_interval_ms == 0 {
            return Err(Error::Config(
                "setup.poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.setup.poll_interval_ms > self.setup.timeout_secs.saturating_mul(1000) {
            return Err(Error::Config(
                "setup.poll_interval_ms must not exceed setup.timeout_secs".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            terminal: TerminalSettings::default(),
            registry: RegistrySettings::default(),
            setup: SetupSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Default terminal columns
    pub default_cols: u16,
    /// Default terminal rows
    pub default_rows: u16,
}

impl TerminalSettings {
    /// Default geometry derived from these settings.
    pub fn default_geometry(&self) -> Geometry {
        Geometry::new(self.default_cols, self.default_rows)
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            default_cols: 80,
            default_rows: 24,
        }
    }
}

/// Session registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self { max_sessions: 10 }
    }
}

/// Settings for long-running setup operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSettings {
    /// Maximum wait before a setup operation is treated as failed, in seconds
    pub timeout_secs: u64,
    /// Polling interval between progress checks, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 100,
        }
    }
}
