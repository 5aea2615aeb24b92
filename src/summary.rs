//! Descriptive statistics for each arm of a story
//!
//! Uses trueno::Vector for SIMD mean/stddev and aprender's DescriptiveStats
//! for the median (R-7 quantile). These numbers are informational only: they
//! appear in JSON reports and debug logs and never influence the intervals.

use crate::samples::SamplePair;
use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use trueno::Vector;

/// Mean, spread and median of one arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    pub mean: f32,
    pub stddev: f32,
    pub median: f32,
}

impl ArmSummary {
    pub fn from_values(values: &[f32]) -> Result<Self> {
        if values.is_empty() {
            anyhow::bail!("Cannot summarize an empty sample");
        }
        let vector = Vector::from_slice(values);
        let mean = vector.mean().context("Failed to compute mean")?;
        let stddev = vector.stddev().context("Failed to compute stddev")?;
        Ok(Self {
            mean,
            stddev,
            median: median(&vector)?,
        })
    }
}

/// Summary of the paired samples that fed a story's interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    pub pairs: usize,
    pub base: ArmSummary,
    pub experiment: ArmSummary,
}

impl StorySummary {
    pub fn from_pairs(pairs: &[SamplePair]) -> Result<Self> {
        let base: Vec<f32> = pairs.iter().map(|p| p.base as f32).collect();
        let experiment: Vec<f32> = pairs.iter().map(|p| p.experiment as f32).collect();
        Ok(Self {
            pairs: pairs.len(),
            base: ArmSummary::from_values(&base).context("base samples")?,
            experiment: ArmSummary::from_values(&experiment).context("experiment samples")?,
        })
    }
}

/// Median via aprender's quantile(0.5)
pub fn median(vector: &Vector<f32>) -> Result<f32> {
    let stats = DescriptiveStats::new(vector);
    stats
        .quantile(0.5)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))
}
