//! End-to-end pipeline: CSV → samples → bootstrap → report

use crate::bootstrap::{EstimateError, RatioBootstrapEstimator, Sample};
use crate::cli::{Cli, OutputFormat};
use crate::config::{ConfigError, EstimatorConfig};
use crate::csv_reader::{read_csv_file, CsvError, CsvTable};
use crate::report::{Report, ReportRow, SortOrder};
use crate::samples::{extract_samples, SamplePair};
use crate::summary::StorySummary;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("No samples collected from CSV. Is this an unsupported benchmark?")]
    NoSamples,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Bootstrap failed: {0}")]
    Estimate(#[from] EstimateError),

    #[error("Failed to render JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SamplePair> for Sample {
    fn from(pair: SamplePair) -> Self {
        Sample {
            before: pair.base,
            after: pair.experiment,
        }
    }
}

/// Estimator settings from parsed arguments; draws a seed when none is given
pub fn config_from_cli(cli: &Cli) -> Result<EstimatorConfig, AppError> {
    let base = match cli.seed {
        Some(seed) => EstimatorConfig {
            seed,
            ..EstimatorConfig::default()
        },
        None => EstimatorConfig::with_random_seed(),
    };
    let config = EstimatorConfig {
        confidence_level: cli.confidence_level,
        num_runs: usize::try_from(cli.runs).unwrap_or(usize::MAX),
        ..base
    };
    config.validate()?;
    Ok(config)
}

/// Compute the ordered report for an already parsed table
pub fn analyze(
    table: &CsvTable,
    config: &EstimatorConfig,
    order: SortOrder,
) -> Result<Report, AppError> {
    config.validate()?;

    let samples = extract_samples(&table.rows);
    let paired = samples.paired();
    if paired.is_empty() {
        return Err(AppError::NoSamples);
    }

    let data: Vec<Vec<Sample>> = paired
        .iter()
        .map(|(_, pairs)| pairs.iter().copied().map(Sample::from).collect())
        .collect();

    tracing::debug!(
        stories = data.len(),
        seed = config.seed,
        runs = config.num_runs,
        confidence = config.confidence_level,
        "running bootstrap"
    );
    let mut estimator = RatioBootstrapEstimator::new(config.seed);
    let estimates = estimator.compute_ratio_estimates(
        &data,
        config.num_runs,
        config.confidence_level,
        config.geometric_mean,
    )?;

    let rows = paired
        .iter()
        .zip(estimates)
        .map(|((story, pairs), estimate)| {
            let row = ReportRow::new(story.as_str(), estimate, samples.any_is_speedometer);
            match StorySummary::from_pairs(pairs) {
                Ok(summary) => {
                    tracing::debug!(
                        story = story.as_str(),
                        pairs = summary.pairs,
                        base_mean = summary.base.mean,
                        exp_mean = summary.experiment.mean,
                        "story summary"
                    );
                    row.with_summary(summary)
                }
                Err(e) => {
                    tracing::debug!("No summary for {}: {:#}", story, e);
                    row
                }
            }
        })
        .collect();

    Ok(Report::new(rows, order))
}

/// Run the whole tool and return the rendered report
pub fn run(cli: &Cli) -> Result<String, AppError> {
    let config = config_from_cli(cli)?;
    let table = read_csv_file(&cli.csv_file)?;
    let order = if cli.sort_by_value {
        SortOrder::Value
    } else {
        SortOrder::Name
    };

    let report = analyze(&table, &config, order)?;
    match cli.format {
        OutputFormat::Text => Ok(report.to_text_string()),
        OutputFormat::Json => Ok(report.to_json_string(&config)? + "\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::parse_csv;
    use crate::report::Significance;

    fn config() -> EstimatorConfig {
        EstimatorConfig {
            seed: 17,
            num_runs: 500,
            ..EstimatorConfig::default()
        }
    }

    #[test]
    fn test_motionmark_improvement_scenario() {
        let csv = "name,displayLabel,avg,stories\n\
                   motionmark,base: r1,100,Foo\n\
                   motionmark,exp: r2,120,Foo\n";
        let table = parse_csv("mm.csv", csv).unwrap();
        let report = analyze(&table, &config(), SortOrder::Name).unwrap();

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.story, "Foo");
        assert!((row.lower_pct - 20.0).abs() < 1e-9);
        assert!((row.upper_pct - 20.0).abs() < 1e-9);
        assert_eq!(row.significance, Significance::Improvement);
        assert_eq!(row.summary.map(|s| s.pairs), Some(1));
    }

    #[test]
    fn test_zero_and_unparsable_values_render_without_nan() {
        let csv = "name,displayLabel,avg,stories\n\
                   motionmark,base:,10,Bar\n\
                   motionmark,base:,0,Bar\n\
                   motionmark,exp:,0,Bar\n\
                   motionmark,exp:,0,Bar\n\
                   motionmark,base:,n/a,Foo\n\
                   motionmark,exp:,n/a,Foo\n";
        let table = parse_csv("mm.csv", csv).unwrap();
        let config = EstimatorConfig {
            seed: 1,
            num_runs: 200,
            ..EstimatorConfig::default()
        };
        let report = analyze(&table, &config, SortOrder::Name).unwrap();

        for row in &report.rows {
            assert!(!row.estimate.lower.is_nan(), "{:?}", row);
            assert!(row.estimate.lower <= row.estimate.upper, "{:?}", row);
            assert!(row.lower_pct <= row.upper_pct, "{:?}", row);
        }
        let foo = &report.rows[1];
        assert_eq!(foo.story, "Foo");
        assert_eq!((foo.lower_pct, foo.upper_pct), (0.0, 0.0));
        assert_eq!(foo.significance, Significance::Inconclusive);
        assert!(!report.to_text_string().contains("NaN"));
    }

    #[test]
    fn test_header_only_has_no_samples() {
        let table = parse_csv("empty.csv", "name,displayLabel,avg\n").unwrap();
        assert!(matches!(
            analyze(&table, &config(), SortOrder::Name),
            Err(AppError::NoSamples)
        ));
    }

    #[test]
    fn test_unpaired_stories_only_has_no_samples() {
        let csv = "name,displayLabel,avg,stories\nmotionmark,base:,100,Foo\n";
        let table = parse_csv("mm.csv", csv).unwrap();
        assert!(matches!(
            analyze(&table, &config(), SortOrder::Name),
            Err(AppError::NoSamples)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let table = parse_csv("mm.csv", "name,displayLabel,avg\n").unwrap();
        let bad = EstimatorConfig {
            num_runs: 0,
            ..config()
        };
        assert!(matches!(
            analyze(&table, &bad, SortOrder::Name),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_no_samples_message() {
        assert_eq!(
            AppError::NoSamples.to_string(),
            "No samples collected from CSV. Is this an unsupported benchmark?"
        );
    }

    #[test]
    fn test_sample_conversion_keeps_before_after() {
        let sample = Sample::from(SamplePair {
            base: 1.0,
            experiment: 2.0,
        });
        assert_eq!(sample.before, 1.0);
        assert_eq!(sample.after, 2.0);
    }
}
