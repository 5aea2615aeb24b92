//! CLI argument parsing for pinpoint-ci

use crate::config::{is_valid_confidence, DEFAULT_CONFIDENCE_LEVEL, DEFAULT_NUM_RUNS};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

const SORT_BY_VALUE: &str = "--sort-by-value";

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width text, one line per story (default)
    Text,
    /// JSON document for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "pinpoint-ci")]
#[command(version)]
#[command(
    about = "Confidence intervals for MotionMark/Speedometer CSV exports from Pinpoint",
    long_about = None
)]
pub struct Cli {
    /// Show the worst changes first and the overall score last
    #[arg(long = "sort-by-value")]
    pub sort_by_value: bool,

    /// CSV file exported from a Pinpoint job
    #[arg(value_name = "CSV_FILE")]
    pub csv_file: PathBuf,

    /// Two-sided confidence level, in (0, 1)
    #[arg(
        value_name = "CONFIDENCE_LEVEL",
        default_value_t = DEFAULT_CONFIDENCE_LEVEL,
        value_parser = parse_confidence_level
    )]
    pub confidence_level: f64,

    /// Bootstrap resamples per story
    #[arg(
        long = "runs",
        value_name = "N",
        default_value_t = DEFAULT_NUM_RUNS as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub runs: u64,

    /// Seed for resampling (random if omitted)
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Parse `args` (program name first), rejecting `--sort-by-value` unless
    /// it is the first argument
    pub fn try_parse_ordered<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let cli = Self::try_parse_from(args.iter())?;
        let first = args.get(1).map(OsString::as_os_str);
        if cli.sort_by_value && first != Some(OsStr::new(SORT_BY_VALUE)) {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                format!("{} must be the first argument", SORT_BY_VALUE),
            ));
        }
        Ok(cli)
    }
}

fn parse_confidence_level(raw: &str) -> Result<f64, String> {
    let level: f64 = raw
        .parse()
        .map_err(|_| format!("`{}` is not a number", raw))?;
    if !is_valid_confidence(level) {
        return Err(format!("{} is not in (0, 1)", level));
    }
    Ok(level)
}
