//! Significance classification, ordering and rendering of story intervals
//!
//! Estimates arrive as before/after ratios. Pinpoint shows after/before
//! percentage change, so each interval is inverted (which also swaps which
//! bound is lower) before classification.

use crate::bootstrap::Estimate;
use crate::config::EstimatorConfig;
use crate::samples::{lower_is_better, SCORE_STORY};
use crate::summary::StorySummary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Whether an interval shows a real change at the chosen confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Improvement,
    Regression,
    Inconclusive,
}

impl Significance {
    /// Classify a percentage interval; `lower_is_better` flips the sign
    pub fn classify(lower_pct: f64, upper_pct: f64, lower_is_better: bool) -> Self {
        let factor = if lower_is_better { -1.0 } else { 1.0 };
        let (lower, upper) = (lower_pct * factor, upper_pct * factor);
        if lower > 0.0 && upper > 0.0 {
            Significance::Improvement
        } else if lower < 0.0 && upper < 0.0 {
            Significance::Regression
        } else {
            Significance::Inconclusive
        }
    }

    /// Two-column marker printed in front of each line
    pub fn marker(self) -> &'static str {
        match self {
            Significance::Improvement => "👍",
            Significance::Regression => "👎",
            Significance::Inconclusive => "  ",
        }
    }
}

/// Row ordering of the rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Lexicographic by story name
    #[default]
    Name,
    /// Worst news first, overall score last
    Value,
}

/// One story's line in the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub story: String,
    pub estimate: Estimate,
    /// Signed percentage change, lower bound
    pub lower_pct: f64,
    /// Signed percentage change, upper bound
    pub upper_pct: f64,
    pub lower_is_better: bool,
    pub significance: Significance,
    pub summary: Option<StorySummary>,
}

impl ReportRow {
    pub fn new(story: impl Into<String>, estimate: Estimate, any_is_speedometer: bool) -> Self {
        let story = story.into();
        let lower_pct = 100.0 * (1.0 / estimate.upper - 1.0);
        let upper_pct = 100.0 * (1.0 / estimate.lower - 1.0);
        let lower_is_better = lower_is_better(&story, any_is_speedometer);
        Self {
            significance: Significance::classify(lower_pct, upper_pct, lower_is_better),
            story,
            estimate,
            lower_pct,
            upper_pct,
            lower_is_better,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: StorySummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn is_score(&self) -> bool {
        self.story == SCORE_STORY
    }

    /// Ratio bounds rounded the way they are displayed, oriented so that a
    /// larger key is always worse news. Returns (upper, lower).
    fn severity_key(&self) -> (i64, i64) {
        let mut lower = round_milli(self.estimate.lower);
        let mut upper = round_milli(self.estimate.upper);
        if self.lower_is_better {
            (lower, upper) = (-upper, -lower);
        }
        (upper, lower)
    }

    /// Fixed-width text line; `name_width` is the longest story name
    pub fn to_line(&self, name_width: usize) -> String {
        format!(
            "{} {:<width$}  [{:+5.1}%, {:+5.1}%]",
            self.significance.marker(),
            self.story,
            self.lower_pct,
            self.upper_pct,
            width = name_width
        )
    }
}

/// Round to the nearest thousandth (ties to even), as an integer
fn round_milli(value: f64) -> i64 {
    (value * 1000.0).round_ties_even() as i64
}

fn compare_by_value(a: &ReportRow, b: &ReportRow) -> Ordering {
    a.is_score()
        .cmp(&b.is_score())
        .then_with(|| b.severity_key().cmp(&a.severity_key()))
        .then_with(|| a.story.cmp(&b.story))
}

/// Ordered report ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub order: SortOrder,
}

impl Report {
    pub fn new(mut rows: Vec<ReportRow>, order: SortOrder) -> Self {
        match order {
            SortOrder::Name => rows.sort_by(|a, b| a.story.cmp(&b.story)),
            SortOrder::Value => rows.sort_by(compare_by_value),
        }
        Self { rows, order }
    }

    /// Build rows from (story, estimate) pairs and order them
    pub fn from_estimates<I>(estimates: I, any_is_speedometer: bool, order: SortOrder) -> Self
    where
        I: IntoIterator<Item = (String, Estimate)>,
    {
        let rows = estimates
            .into_iter()
            .map(|(story, estimate)| ReportRow::new(story, estimate, any_is_speedometer))
            .collect();
        Self::new(rows, order)
    }

    fn name_width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.story.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Human-readable report, one line per story
    pub fn to_text_string(&self) -> String {
        let width = self.name_width();
        let mut out = String::new();
        for row in &self.rows {
            if self.order == SortOrder::Value && row.is_score() {
                out.push('\n');
            }
            out.push_str(&row.to_line(width));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self, config: &EstimatorConfig) -> JsonReport {
        JsonReport {
            confidence_level: config.confidence_level,
            num_runs: config.num_runs,
            seed: config.seed,
            geometric_mean: config.geometric_mean,
            stories: self
                .rows
                .iter()
                .map(|row| JsonStory {
                    story: row.story.clone(),
                    lower_pct: row.lower_pct,
                    upper_pct: row.upper_pct,
                    significance: row.significance,
                    lower_is_better: row.lower_is_better,
                    ratio_lower: row.estimate.lower,
                    ratio_upper: row.estimate.upper,
                    summary: row.summary,
                })
                .collect(),
        }
    }

    pub fn to_json_string(&self, config: &EstimatorConfig) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_json(config))
    }
}

/// JSON report document (--format json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub confidence_level: f64,
    pub num_runs: usize,
    pub seed: u64,
    pub geometric_mean: bool,
    pub stories: Vec<JsonStory>,
}

/// One story in the JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonStory {
    pub story: String,
    pub lower_pct: f64,
    pub upper_pct: f64,
    pub significance: Significance,
    pub lower_is_better: bool,
    /// Before/after ratio interval the percentages were derived from
    pub ratio_lower: f64,
    pub ratio_upper: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<StorySummary>,
}
