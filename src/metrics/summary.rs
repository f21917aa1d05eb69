//! Descriptive statistics over a batch of terminal values.

use serde::{Deserialize, Serialize};

use crate::core::timeseries::{mean, sample_std};
use crate::core::{Result, WealthError};

/// Statistics of one column of terminal values across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Mean terminal value.
    pub mean: f64,
    /// Sample standard deviation (0 for a single run).
    pub std: f64,
    /// Best (maximum) terminal value.
    pub best: f64,
    /// Worst (minimum) terminal value.
    pub worst: f64,
}

impl ColumnStats {
    /// Compute statistics for a set of values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            mean: mean(values),
            std: if values.len() < 2 { 0.0 } else { sample_std(values) },
            best: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst: values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Summary of one valuation mode of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Per-asset terminal statistics, in asset order.
    pub per_asset: Vec<ColumnStats>,
    /// Statistics of the per-run portfolio total.
    pub total: ColumnStats,
    /// Percentage of runs ending strictly above the target, if one was given.
    pub target_probability_pct: Option<f64>,
    /// Number of runs summarized.
    pub runs: usize,
}

/// Summarize a run-major terminal matrix (one row per run, one column per asset).
///
/// Every row must have the first row's length.
pub fn summarize(terminal: &[Vec<f64>], target: Option<f64>) -> Result<BatchSummary> {
    let runs = terminal.len();
    let num_assets = terminal.first().map_or(0, Vec::len);
    if let Some(row) = terminal.iter().find(|row| row.len() != num_assets) {
        return Err(WealthError::length_mismatch(num_assets, row.len()));
    }

    let per_asset = (0..num_assets)
        .map(|j| {
            let column: Vec<f64> = terminal.iter().map(|row| row[j]).collect();
            ColumnStats::from_values(&column)
        })
        .collect();

    let totals = run_totals(terminal);
    let target_probability_pct = target.map(|t| probability_above(&totals, t));

    Ok(BatchSummary {
        per_asset,
        total: ColumnStats::from_values(&totals),
        target_probability_pct,
        runs,
    })
}

/// Portfolio total of each run.
pub fn run_totals(terminal: &[Vec<f64>]) -> Vec<f64> {
    terminal.iter().map(|row| row.iter().sum()).collect()
}

/// Percentage of values strictly greater than `target`.
pub fn probability_above(values: &[f64], target: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let favourable = values.iter().filter(|&&v| v > target).count();
    favourable as f64 / values.len() as f64 * 100.0
}
