//! Percentile bootstrap for the ratio of paired means
//!
//! Each story's paired samples are resampled with replacement (one index
//! selects both halves of a pair) and the ratio statistic is recomputed for
//! every resample. The interval bounds are empirical percentiles of those
//! statistics.
//!
//! The estimator owns its random source. Seeding it once and processing
//! stories in order makes a run fully reproducible from the seed.
//!
//! Zeros are legal input (unparsable cells become `0.0`). A resample whose
//! arms are both zero has ratio 1 (no change), a zero `after` alone gives an
//! infinite ratio, and any statistic that is still NaN is dropped before the
//! percentiles are taken. A story with no usable statistic at all gets the
//! point interval `[1, 1]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// One paired observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub before: f64,
    pub after: f64,
}

/// Confidence interval on the before/after ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum EstimateError {
    #[error("Number of bootstrap runs must be positive")]
    NoRuns,

    #[error("Confidence level must be in (0, 1), got {0}")]
    InvalidConfidence(f64),

    #[error("Story #{index} has no samples")]
    EmptyStory { index: usize },
}

/// Bootstrap estimator with an explicitly seeded random source
#[derive(Debug, Clone)]
pub struct RatioBootstrapEstimator {
    rng: StdRng,
}

impl RatioBootstrapEstimator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Compute one interval per story, in input order.
    ///
    /// With `compute_geometric_mean` the statistic is the geometric mean of
    /// the per-pair ratios instead of the ratio of arithmetic means.
    pub fn compute_ratio_estimates(
        &mut self,
        data: &[Vec<Sample>],
        num_runs: usize,
        confidence_level: f64,
        compute_geometric_mean: bool,
    ) -> Result<Vec<Estimate>, EstimateError> {
        if num_runs == 0 {
            return Err(EstimateError::NoRuns);
        }
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(EstimateError::InvalidConfidence(confidence_level));
        }
        if let Some(index) = data.iter().position(Vec::is_empty) {
            return Err(EstimateError::EmptyStory { index });
        }

        let alpha = (1.0 - confidence_level) / 2.0;
        let mut estimates = Vec::with_capacity(data.len());
        for samples in data {
            let mut stats = if compute_geometric_mean {
                self.resample_log_ratios(samples, num_runs)
            } else {
                self.resample_mean_ratios(samples, num_runs)
            };
            let drawn = stats.len();
            stats.retain(|s| !s.is_nan());
            if stats.len() < drawn {
                tracing::debug!(dropped = drawn - stats.len(), "undefined bootstrap ratios");
            }
            stats.sort_by(f64::total_cmp);

            let estimate = if stats.is_empty() {
                Estimate {
                    lower: 1.0,
                    upper: 1.0,
                }
            } else {
                Estimate {
                    lower: percentile(&stats, alpha),
                    upper: percentile(&stats, 1.0 - alpha),
                }
            };
            tracing::trace!(
                samples = samples.len(),
                lower = estimate.lower,
                upper = estimate.upper,
                "bootstrap estimate"
            );
            estimates.push(estimate);
        }

        Ok(estimates)
    }

    fn resample_mean_ratios(&mut self, samples: &[Sample], num_runs: usize) -> Vec<f64> {
        let n = samples.len();
        (0..num_runs)
            .map(|_| {
                let mut sum_before = 0.0;
                let mut sum_after = 0.0;
                for _ in 0..n {
                    let sample = samples[self.rng.gen_range(0..n)];
                    sum_before += sample.before;
                    sum_after += sample.after;
                }
                // n cancels out of mean(before) / mean(after)
                ratio(sum_before, sum_after)
            })
            .collect()
    }

    fn resample_log_ratios(&mut self, samples: &[Sample], num_runs: usize) -> Vec<f64> {
        let log_ratios: Vec<f64> = samples
            .iter()
            .map(|s| ratio(s.before, s.after).ln())
            .collect();
        let n = log_ratios.len();
        (0..num_runs)
            .map(|_| {
                let sum: f64 = (0..n)
                    .map(|_| log_ratios[self.rng.gen_range(0..n)])
                    .sum();
                (sum / n as f64).exp()
            })
            .collect()
    }
}

/// `before / after`, with `0 / 0` meaning no change
fn ratio(before: f64, after: f64) -> f64 {
    if before == 0.0 && after == 0.0 {
        1.0
    } else {
        before / after
    }
}

/// Linear-interpolated percentile of sorted, NaN-free data, `q` in [0, 1]
///
/// Between a finite and an infinite neighbour the nearer rank is taken.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [only] => *only,
        _ => {
            let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let (a, b) = (sorted[lo], sorted[hi]);
            let frac = rank - lo as f64;
            if lo == hi || a == b {
                a
            } else if a.is_infinite() || b.is_infinite() {
                if frac < 0.5 {
                    a
                } else {
                    b
                }
            } else {
                a + frac * (b - a)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(before: &[f64], after: &[f64]) -> Vec<Sample> {
        before
            .iter()
            .zip(after)
            .map(|(&before, &after)| Sample { before, after })
            .collect()
    }

    #[test]
    fn test_constant_ratio_gives_point_interval() {
        let data = vec![pairs(&[10.0, 20.0, 30.0], &[5.0, 10.0, 15.0])];
        let mut estimator = RatioBootstrapEstimator::new(1);
        let est = estimator.compute_ratio_estimates(&data, 500, 0.99, false).unwrap();
        assert!((est[0].lower - 2.0).abs() < 1e-12);
        assert!((est[0].upper - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_pair_degenerates_to_its_ratio() {
        let data = vec![pairs(&[100.0], &[120.0])];
        let mut estimator = RatioBootstrapEstimator::new(7);
        let est = estimator.compute_ratio_estimates(&data, 100, 0.99, false).unwrap();
        assert!((est[0].lower - 100.0 / 120.0).abs() < 1e-12);
        assert_eq!(est[0].lower, est[0].upper);
    }

    #[test]
    fn test_interval_contains_observed_ratio() {
        let before = [100.0, 102.0, 98.0, 101.0, 99.0, 103.0, 97.0, 100.0];
        let after = [120.0, 121.0, 119.0, 122.0, 118.0, 120.0, 121.0, 119.0];
        let data = vec![pairs(&before, &after)];
        let mut estimator = RatioBootstrapEstimator::new(42);
        let est = estimator.compute_ratio_estimates(&data, 2000, 0.99, false).unwrap();

        let observed = before.iter().sum::<f64>() / after.iter().sum::<f64>();
        assert!(est[0].lower <= observed && observed <= est[0].upper);
        assert!(est[0].upper < 1.0, "clear slowdown must exclude 1.0");
    }

    #[test]
    fn test_lower_not_above_upper() {
        let data = vec![
            pairs(&[1.0, 5.0, 2.0, 8.0], &[3.0, 1.0, 7.0, 2.0]),
            pairs(&[10.0, 11.0], &[9.0, 12.0]),
        ];
        let mut estimator = RatioBootstrapEstimator::new(3);
        for est in estimator.compute_ratio_estimates(&data, 300, 0.9, false).unwrap() {
            assert!(est.lower <= est.upper);
            assert!(est.lower.is_finite() && est.upper.is_finite());
        }
    }

    #[test]
    fn test_same_seed_reproduces_intervals() {
        let data = vec![
            pairs(&[1.0, 2.0, 3.0, 4.0], &[1.5, 2.2, 2.9, 4.4]),
            pairs(&[7.0, 8.0, 9.0], &[6.0, 8.5, 9.5]),
        ];
        let a = RatioBootstrapEstimator::new(99)
            .compute_ratio_estimates(&data, 400, 0.95, false)
            .unwrap();
        let b = RatioBootstrapEstimator::new(99)
            .compute_ratio_estimates(&data, 400, 0.95, false)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wider_confidence_gives_wider_interval() {
        let data = vec![pairs(
            &[10.0, 12.0, 9.0, 11.0, 13.0, 10.0],
            &[11.0, 10.0, 12.0, 9.0, 12.0, 11.0],
        )];
        let narrow = RatioBootstrapEstimator::new(5)
            .compute_ratio_estimates(&data, 2000, 0.5, false)
            .unwrap()[0];
        let wide = RatioBootstrapEstimator::new(5)
            .compute_ratio_estimates(&data, 2000, 0.99, false)
            .unwrap()[0];
        assert!(wide.lower <= narrow.lower);
        assert!(wide.upper >= narrow.upper);
    }

    #[test]
    fn test_geometric_mean_of_constant_ratios() {
        let data = vec![pairs(&[2.0, 4.0, 8.0], &[1.0, 2.0, 4.0])];
        let est = RatioBootstrapEstimator::new(11)
            .compute_ratio_estimates(&data, 200, 0.99, true)
            .unwrap();
        assert!((est[0].lower - 2.0).abs() < 1e-9);
        assert!((est[0].upper - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_preserved() {
        let data = vec![pairs(&[3.0], &[1.0]), pairs(&[1.0], &[4.0])];
        let est = RatioBootstrapEstimator::new(0)
            .compute_ratio_estimates(&data, 10, 0.99, false)
            .unwrap();
        assert_eq!(est.len(), 2);
        assert!((est[0].lower - 3.0).abs() < 1e-12);
        assert!((est[1].lower - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let data = vec![pairs(&[1.0], &[1.0])];
        let mut estimator = RatioBootstrapEstimator::new(0);
        assert_eq!(
            estimator.compute_ratio_estimates(&data, 0, 0.99, false),
            Err(EstimateError::NoRuns)
        );
        assert_eq!(
            estimator.compute_ratio_estimates(&data, 10, 1.0, false),
            Err(EstimateError::InvalidConfidence(1.0))
        );
        assert!(matches!(
            estimator.compute_ratio_estimates(&data, 10, f64::NAN, false),
            Err(EstimateError::InvalidConfidence(_))
        ));
        assert_eq!(
            estimator.compute_ratio_estimates(&[vec![]], 10, 0.99, false),
            Err(EstimateError::EmptyStory { index: 0 })
        );
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 5.0);
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert!((percentile(&sorted, 0.1) - 1.4).abs() < 1e-12);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_percentile_with_infinities() {
        let sorted = [1.0, f64::INFINITY, f64::INFINITY];
        assert_eq!(percentile(&sorted, 1.0), f64::INFINITY);
        assert_eq!(percentile(&sorted, 0.75), f64::INFINITY);

        let sorted = [f64::NEG_INFINITY, 1.0, 2.0];
        assert_eq!(percentile(&sorted, 0.1), f64::NEG_INFINITY);
        assert_eq!(percentile(&sorted, 0.4), 1.0);
    }

    #[test]
    fn test_zero_pairs_never_produce_nan() {
        let data = vec![
            pairs(&[10.0, 0.0], &[0.0, 0.0]),
            pairs(&[0.0, 0.0, 5.0], &[0.0, 4.0, 5.0]),
            pairs(&[0.0], &[0.0]),
        ];
        for geometric in [false, true] {
            let est = RatioBootstrapEstimator::new(1)
                .compute_ratio_estimates(&data, 200, 0.99, geometric)
                .unwrap();
            for e in &est {
                assert!(!e.lower.is_nan() && !e.upper.is_nan(), "{:?}", e);
                assert!(e.lower <= e.upper, "{:?}", e);
            }
            // Both arms zero everywhere: no change
            assert_eq!(est[2], Estimate { lower: 1.0, upper: 1.0 });
        }
    }

    #[test]
    fn test_zero_after_gives_infinite_upper_bound() {
        let data = vec![pairs(&[10.0, 0.0], &[0.0, 0.0])];
        let est = RatioBootstrapEstimator::new(1)
            .compute_ratio_estimates(&data, 200, 0.99, false)
            .unwrap()[0];
        assert_eq!(est.lower, 1.0);
        assert_eq!(est.upper, f64::INFINITY);
    }

    #[test]
    fn test_opposite_infinite_log_ratios_are_dropped() {
        // ln(10/0) + ln(0/10) is NaN; resamples drawing both pairs are discarded
        let data = vec![pairs(&[10.0, 0.0], &[0.0, 10.0])];
        let est = RatioBootstrapEstimator::new(4)
            .compute_ratio_estimates(&data, 200, 0.9, true)
            .unwrap()[0];
        assert!(!est.lower.is_nan() && est.lower <= est.upper);
    }
}
