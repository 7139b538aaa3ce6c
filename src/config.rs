//! Configuration management and validation.
//!
//! Provides the processing configuration with defaults, builder-style
//! overrides and loading from a JSON file in the user config directory.

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_SAMPLING_INTERVAL};
use crate::error::{AquamonError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the normalizer treats a record whose coordinates cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MalformedCoordinatePolicy {
    /// Fail the whole batch on the first malformed coordinate
    #[default]
    Abort,
    /// Keep the record with a NaN coordinate (serialized as null)
    Sentinel,
    /// Drop the record and count it
    Skip,
}

/// Global configuration for payload processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AquamonConfig {
    /// Maximum worker invocations running at once
    pub max_concurrent_workers: usize,

    /// Window size used when a sampling payload carries no config
    pub sampling_interval: usize,

    /// Handling of malformed coordinate strings
    pub coordinate_policy: MalformedCoordinatePolicy,

    /// Pretty-print JSON output files
    pub pretty_output: bool,
}

impl Default for AquamonConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workers: num_cpus::get().max(1),
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            coordinate_policy: MalformedCoordinatePolicy::default(),
            pretty_output: true,
        }
    }
}

impl AquamonConfig {
    /// Default location of the configuration file
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AquamonError::configuration("Could not determine user config directory")
        })?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| AquamonError::InvalidPayload {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, else the default path if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AquamonError::InputNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check values that would make processing impossible
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_workers == 0 {
            return Err(AquamonError::configuration(
                "max_concurrent_workers must be at least 1",
            ));
        }
        if self.sampling_interval == 0 {
            return Err(AquamonError::InvalidWindowSize { size: 0 });
        }
        Ok(())
    }

    /// Set maximum concurrent workers
    pub fn with_max_concurrent_workers(mut self, workers: usize) -> Self {
        self.max_concurrent_workers = workers;
        self
    }

    /// Set the fallback sampling interval
    pub fn with_sampling_interval(mut self, interval: usize) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Set the malformed coordinate policy
    pub fn with_coordinate_policy(mut self, policy: MalformedCoordinatePolicy) -> Self {
        self.coordinate_policy = policy;
        self
    }

    /// Write compact JSON output
    pub fn with_compact_output(mut self) -> Self {
        self.pretty_output = false;
        self
    }
}
