//! Saved results on disk
//!
//! A single run is stored as one JSON object; a comparison as a bare JSON
//! array of those objects. Loading decides the shape once and hands back
//! a `SavedReport`.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::runner::BenchmarkRun;

/// What a results file turned out to hold
#[derive(Debug, Clone, PartialEq)]
pub enum SavedReport {
    Single(BenchmarkRun),
    Comparison(Vec<BenchmarkRun>),
}

impl SavedReport {
    pub fn runs(&self) -> &[BenchmarkRun] {
        match self {
            SavedReport::Single(run) => std::slice::from_ref(run),
            SavedReport::Comparison(runs) => runs,
        }
    }

    pub fn into_runs(self) -> Vec<BenchmarkRun> {
        match self {
            SavedReport::Single(run) => vec![run],
            SavedReport::Comparison(runs) => runs,
        }
    }
}

pub fn save_run(run: &BenchmarkRun, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(run)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_run(path: &Path) -> Result<BenchmarkRun> {
    let content = read(path)?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn save_comparison(runs: &[BenchmarkRun], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(runs)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Load either format. A one-element array is still reported as a
/// comparison; callers decide how to render it.
pub fn load_report(path: &Path) -> Result<SavedReport> {
    let content = read(path)?;
    parse_report(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_report(content: &str) -> Result<SavedReport> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(_) => {
            let runs: Vec<BenchmarkRun> = serde_json::from_value(value)?;
            anyhow::ensure!(!runs.is_empty(), "results file contains no runs");
            Ok(SavedReport::Comparison(runs))
        }
        Value::Object(_) => Ok(SavedReport::Single(serde_json::from_value(value)?)),
        _ => anyhow::bail!("expected a run object or an array of runs"),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
