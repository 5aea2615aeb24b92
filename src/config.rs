//! Estimator settings
//!
//! Defaults match what Pinpoint itself uses, so reports from this tool line up
//! with the ones shown on the Pinpoint job page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bootstrap resamples per story used by Pinpoint
pub const DEFAULT_NUM_RUNS: usize = 2000;

/// Two-sided confidence level used by Pinpoint
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.99;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("confidence_level must be in (0, 1), got {0}")]
    ConfidenceLevel(f64),

    #[error("num_runs must be >= 1, got {0}")]
    NumRuns(usize),
}

/// Settings for one estimation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Two-sided confidence level of the reported intervals
    ///
    /// - 0.99 (default): 0.5th and 99.5th percentiles of the resampled ratios
    /// - 0.95: 2.5th and 97.5th percentiles
    pub confidence_level: f64,

    /// Bootstrap resamples per story
    pub num_runs: usize,

    /// Aggregate per-pair ratios by geometric mean instead of the ratio of
    /// arithmetic means
    pub geometric_mean: bool,

    /// Seed for the resampling engine
    pub seed: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            num_runs: DEFAULT_NUM_RUNS,
            geometric_mean: false,
            seed: 0,
        }
    }
}

impl EstimatorConfig {
    /// Default settings with a seed drawn from OS entropy
    pub fn with_random_seed() -> Self {
        Self {
            seed: rand::random(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_confidence(self.confidence_level) {
            return Err(ConfigError::ConfidenceLevel(self.confidence_level));
        }
        if self.num_runs == 0 {
            return Err(ConfigError::NumRuns(self.num_runs));
        }
        Ok(())
    }
}

/// Open interval (0, 1); NaN is rejected
pub fn is_valid_confidence(level: f64) -> bool {
    level > 0.0 && level < 1.0
}
