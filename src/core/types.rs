//! Core data types for wealthmc.

use serde::{Deserialize, Serialize};

use super::error::{Result, WealthError};

/// Type alias for price values.
pub type Price = f64;

/// Type alias for timestamp values (nanoseconds since epoch).
pub type Timestamp = i64;

/// Asset-major matrix: one row per asset, one column per time step.
pub type AssetMatrix = Vec<Vec<f64>>;

/// Days per year used for daily stepping and annualization.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// How often the portfolio is rebalanced, in simulated periods (days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceCadence {
    /// Every 30 periods.
    Monthly,
    /// Every 60 periods.
    Quarterly,
    /// Every 180 periods.
    Semiannual,
    /// Every 365 periods.
    Annual,
    /// Every `n` periods.
    Custom(usize),
}

impl RebalanceCadence {
    /// Number of periods between rebalancing boundaries.
    #[inline]
    pub fn periods(self) -> usize {
        match self {
            RebalanceCadence::Monthly => 30,
            RebalanceCadence::Quarterly => 60,
            RebalanceCadence::Semiannual => 180,
            RebalanceCadence::Annual => 365,
            RebalanceCadence::Custom(n) => n,
        }
    }

    /// Parse a cadence name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "monthly" => Some(RebalanceCadence::Monthly),
            "quarterly" => Some(RebalanceCadence::Quarterly),
            "semiannual" => Some(RebalanceCadence::Semiannual),
            "annual" => Some(RebalanceCadence::Annual),
            _ => None,
        }
    }

    /// Whether period `i` (0-based) is a rebalancing boundary.
    ///
    /// The first period never is.
    #[inline]
    pub fn is_boundary(self, i: usize) -> bool {
        let n = self.periods();
        i != 0 && n != 0 && (i + 1) % n == 0
    }
}

impl Default for RebalanceCadence {
    fn default() -> Self {
        RebalanceCadence::Monthly
    }
}

/// Lifecycle phase deciding the sign of the cash flow at each boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Cash is contributed.
    Accumulation,
    /// Cash is withdrawn.
    Distribution,
}

impl Phase {
    /// Signed cash flow for an unsigned amount.
    #[inline]
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Phase::Accumulation => amount,
            Phase::Distribution => -amount,
        }
    }

    /// Parse a phase name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "accumulation" => Some(Phase::Accumulation),
            "distribution" => Some(Phase::Distribution),
            _ => None,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Accumulation
    }
}

/// Whether period values are discounted by inflation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMode {
    /// Inflation-adjusted.
    Real,
    /// Unadjusted.
    Nominal,
}

/// How per-asset drift and volatility are fed to the path generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftMode {
    /// One asset's annualized statistics applied to every asset.
    Broadcast { asset_index: usize },
    /// Each asset uses its own annualized statistics.
    PerAsset,
}

impl Default for DriftMode {
    fn default() -> Self {
        DriftMode::Broadcast { asset_index: 0 }
    }
}

/// One point of a flattened trajectory table.
///
/// Both indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub simulation: usize,
    pub period: usize,
    pub value: f64,
}

/// Check that a weight vector has the expected length and sums to 1.
pub fn validate_weights(weights: &[f64], num_assets: usize) -> Result<()> {
    if weights.len() != num_assets {
        return Err(WealthError::length_mismatch(num_assets, weights.len()));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(WealthError::invalid_parameter("weights must be finite"));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(WealthError::invalid_parameter(format!(
            "weights must sum to 1.0, got {total}"
        )));
    }
    Ok(())
}

/// Tolerance for weight sums.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;
