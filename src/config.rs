//! Experiment configuration.
//!
//! [`PaesConfig`] holds the optimizer parameters; [`ExperimentConfig`] adds
//! the resource pool definition and is what an experiment file (TOML)
//! deserializes into. Missing keys fall back to the defaults below.
//!
//! ```toml
//! [paes]
//! archive_size = 50
//! max_iterations = 20000
//! stability_interval = 1000
//! seed = 7
//!
//! [[resources]]
//! id = 0
//! name = "cheap"
//! pricing = { kind = "linear", base = 0.0, rate = 0.1 }
//!
//! [[resources]]
//! id = 1
//! name = "fast"
//! pricing = { kind = "flat", price = 4.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PaesError, Result};
use crate::models::{ResourcePool, ResourceSpec};
use crate::paes::MAX_LOCATION_BITS;

/// Default archive capacity.
pub const DEFAULT_ARCHIVE_SIZE: usize = 100;
/// Default grid bits per objective axis.
pub const DEFAULT_LOCATION_BITS: u32 = 16;
/// Default iteration limit.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;
/// Default progress report interval.
pub const DEFAULT_REPORT_INTERVAL: u64 = 10_000;

/// PAES parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaesConfig {
    /// Maximum number of archived schedules.
    pub archive_size: usize,
    /// Grid resolution per objective axis (1..=32).
    pub location_bits: u32,
    /// Iteration limit.
    pub max_iterations: u64,
    /// Sample the archive distance every this many iterations and stop once
    /// two consecutive samples are equal. `None` disables the check.
    pub stability_interval: Option<u64>,
    /// Emit a progress report every this many iterations (0 disables).
    pub report_interval: u64,
    /// RNG seed. `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl Default for PaesConfig {
    fn default() -> Self {
        Self {
            archive_size: DEFAULT_ARCHIVE_SIZE,
            location_bits: DEFAULT_LOCATION_BITS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stability_interval: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
            seed: None,
        }
    }
}

impl PaesConfig {
    /// Sets the archive capacity.
    pub fn with_archive_size(mut self, size: usize) -> Self {
        self.archive_size = size;
        self
    }

    /// Sets the grid resolution.
    pub fn with_location_bits(mut self, bits: u32) -> Self {
        self.location_bits = bits;
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Enables the distance-stability stop.
    pub fn with_stability_interval(mut self, interval: u64) -> Self {
        self.stability_interval = Some(interval);
        self
    }

    /// Sets the progress report interval.
    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.archive_size == 0 {
            return Err(PaesError::InvalidConfig(
                "archive_size must be at least 1".into(),
            ));
        }
        if self.location_bits == 0 || self.location_bits > MAX_LOCATION_BITS {
            return Err(PaesError::InvalidConfig(format!(
                "location_bits must be in 1..={MAX_LOCATION_BITS}, got {}",
                self.location_bits
            )));
        }
        if self.stability_interval == Some(0) {
            return Err(PaesError::InvalidConfig(
                "stability_interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Optimizer parameters plus the resource pool of one experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Optimizer parameters.
    pub paes: PaesConfig,
    /// Resource definitions. Empty means the three-resource preset.
    pub resources: Vec<ResourceSpec>,
}

impl ExperimentConfig {
    /// Parses a TOML experiment file.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PaesError::InvalidConfig(e.to_string()))?;
        config.paes.validate()?;
        Ok(config)
    }

    /// Configured resource definitions, or the three-resource preset.
    pub fn resource_specs(&self) -> Vec<ResourceSpec> {
        if self.resources.is_empty() {
            ResourceSpec::three_simple()
        } else {
            self.resources.clone()
        }
    }

    /// Builds the configured pool.
    pub fn build_pool(&self) -> Result<ResourcePool> {
        ResourcePool::from_specs(&self.resource_specs())
    }
}
