//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! profiler-config.toml file, plus the validation gate the interpolation
//! engine runs before doing any work. File loading is forgiving (missing or
//! malformed files fall back to defaults, with a warning); validation is
//! strict, because a bad depth axis would silently corrupt every grid.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration rejected before interpolation starts.
///
/// These are the only hard failures in the crate: the engine refuses to run
/// and performs no partial work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Depth axis spacing must be a positive number of meters
    #[error("depth resolution must be positive, got {0}")]
    NonPositiveResolution(f64),

    /// Depth axis upper bound must not be negative
    #[error("maximum depth must be non-negative, got {0}")]
    NegativeMaxDepth(f64),
}

/// Interpolation run configuration loaded from profiler-config.toml
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    /// Depth axis spacing in meters (must be > 0)
    pub depth_resolution: f64,
    /// Depth axis upper bound in meters (must be >= 0)
    pub max_depth: f64,
    /// Extend the shallowest/deepest readings to cover the whole axis
    pub fill_extrapolated: bool,
    /// Variables to build grids for; empty means every variable the
    /// registry knows about
    pub variables: BTreeSet<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            depth_resolution: 0.1,
            max_depth: 30.0,
            fill_extrapolated: true,
            variables: BTreeSet::new(),
        }
    }
}

impl GridConfig {
    /// Load configuration from profiler-config.toml in the working directory.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path("profiler-config.toml")
    }

    /// Load configuration from the specified path.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<GridConfig>(&contents) {
                Ok(config) => {
                    info!(
                        "loaded grid configuration: {} m resolution to {} m",
                        config.depth_resolution, config.max_depth
                    );
                    config
                }
                Err(e) => {
                    warn!("invalid config file format ({e}); using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save the current configuration to the specified path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let contents = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, contents)
    }

    /// Reject malformed settings before any computation begins.
    ///
    /// NaN is rejected along with out-of-range values; a NaN bound would
    /// otherwise slip through ordinary comparisons.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth_resolution.is_nan() || self.depth_resolution <= 0.0 {
            return Err(ConfigError::NonPositiveResolution(self.depth_resolution));
        }
        if self.max_depth.is_nan() || self.max_depth < 0.0 {
            return Err(ConfigError::NegativeMaxDepth(self.max_depth));
        }
        Ok(())
    }
}
