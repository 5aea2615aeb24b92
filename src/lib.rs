//! pinpoint-ci - confidence intervals for paired benchmark results
//!
//! Reads MotionMark or Speedometer CSV exports from Pinpoint A/B jobs,
//! estimates a bootstrap confidence interval for the change of every story
//! and renders a report that marks significant improvements and regressions.

pub mod app;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod csv_reader;
pub mod report;
pub mod samples;
pub mod summary;
