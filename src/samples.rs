//! Extraction of paired base/experiment samples from Pinpoint CSV rows
//!
//! Pinpoint exports contain many metrics per benchmark. Only the aggregate
//! MotionMark and Speedometer rows are used: each accepted row is filed under
//! a story and appended to either the base or the experiment sequence of that
//! story, in file order.
//!
//! The family detection below is a set of string heuristics that mirror what
//! Pinpoint writes. They are kept literal on purpose; downstream consumers
//! compare reports produced from the same rules.

use crate::csv_reader::Row;
use std::collections::BTreeMap;

/// Story name of the overall benchmark score; always higher-is-better
pub const SCORE_STORY: &str = "Score";

const BASE_LABEL: &str = "base:";
const EXPERIMENT_LABEL: &str = "exp:";

/// Which arm of the comparison a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arm {
    Base,
    Experiment,
}

impl Arm {
    /// Classify a `displayLabel` value
    pub fn from_display_label(label: &str) -> Option<Self> {
        if label.contains(BASE_LABEL) {
            Some(Arm::Base)
        } else if label.contains(EXPERIMENT_LABEL) {
            Some(Arm::Experiment)
        } else {
            None
        }
    }
}

/// One positional (base, experiment) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePair {
    pub base: f64,
    pub experiment: f64,
}

/// Raw measurements of one story, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorySamples {
    pub base: Vec<f64>,
    pub experiment: Vec<f64>,
}

impl StorySamples {
    pub fn push(&mut self, arm: Arm, value: f64) {
        match arm {
            Arm::Base => self.base.push(value),
            Arm::Experiment => self.experiment.push(value),
        }
    }

    /// Pair the i-th base with the i-th experiment value.
    ///
    /// Pinpoint always produces equal counts; if they differ, the surplus of
    /// the longer sequence is dropped.
    pub fn pairs(&self) -> Vec<SamplePair> {
        self.base
            .iter()
            .zip(&self.experiment)
            .map(|(&base, &experiment)| SamplePair { base, experiment })
            .collect()
    }

    pub fn pair_count(&self) -> usize {
        self.base.len().min(self.experiment.len())
    }
}

/// Everything collected from one input file
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub stories: BTreeMap<String, StorySamples>,
    /// True once any accepted row was recognized as Speedometer
    pub any_is_speedometer: bool,
}

impl SampleSet {
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Paired samples per story, skipping stories without a single pair
    pub fn paired(&self) -> Vec<(String, Vec<SamplePair>)> {
        self.stories
            .iter()
            .filter_map(|(story, samples)| {
                let pairs = samples.pairs();
                if pairs.is_empty() {
                    tracing::warn!(
                        "Story {} has no paired samples ({} base, {} exp), skipping",
                        story,
                        samples.base.len(),
                        samples.experiment.len()
                    );
                    None
                } else {
                    Some((story.clone(), pairs))
                }
            })
            .collect()
    }
}

/// Speedometer reports times (lower is better), except for its overall score
pub fn lower_is_better(story: &str, any_is_speedometer: bool) -> bool {
    any_is_speedometer && story != SCORE_STORY
}

/// Best-effort numeric parse; anything unusable becomes 0.0
pub fn parse_value(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::debug!("Unparsable value {:?}, using 0.0", raw);
            0.0
        }
    }
}

fn is_motionmark(row: &Row, name: &str) -> bool {
    name == "motionmark" || row.contains("motionmarkTag")
}

fn is_speedometer(row: &Row, name: &str) -> bool {
    name.contains("TodoMVC") || row.get("stories") == Some("Speedometer3")
}

fn is_sub_metric(name: &str) -> bool {
    name.contains('/') || name.contains("Lower") || name.contains("Upper")
}

/// Walk all rows once and collect per-story samples
pub fn extract_samples<'a, I>(rows: I) -> SampleSet
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut set = SampleSet::default();

    for row in rows {
        let (Some(name), Some(display_label), Some(avg)) =
            (row.get("name"), row.get("displayLabel"), row.get("avg"))
        else {
            continue;
        };
        let value = parse_value(avg);

        let motionmark = is_motionmark(row, name);
        let speedometer = is_speedometer(row, name);
        if !motionmark && !speedometer {
            continue;
        }
        set.any_is_speedometer |= speedometer;

        if is_sub_metric(name) {
            continue;
        }

        let story = if name == "motionmark" {
            let Some(story) = row.get("stories") else {
                tracing::warn!("Could not find MotionMark story");
                continue;
            };
            story
        } else {
            name
        };

        let Some(arm) = Arm::from_display_label(display_label) else {
            tracing::warn!("Unknown display_label {}", display_label);
            continue;
        };

        set.stories
            .entry(story.to_string())
            .or_default()
            .push(arm, value);
    }

    tracing::debug!(
        stories = set.stories.len(),
        speedometer = set.any_is_speedometer,
        "extracted samples"
    );

    set
}
