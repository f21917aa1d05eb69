//! Rebalancing portfolio evolution with periodic cash flows and inflation.
//!
//! The evolver walks a return matrix (one row per asset, one column per
//! period) and tracks per-asset weights and investable capital. Each period:
//!
//! 1. At a rebalancing boundary the weights become each asset's share of
//!    `(r[j][i] + 1) * prev[j]`, with `prev` the previous period's per-asset
//!    values. The current period's return enters both the new weights and the
//!    valuation below.
//! 2. Asset `j` is worth `(r[j][i] + 1) * w[j] * capital`, less one day of
//!    inflation in real terms.
//! 3. The period total is recorded.
//! 4. The next period's capital is the total, plus or minus the cash flow at
//!    a boundary.

use serde::{Deserialize, Serialize};

use crate::core::types::{
    validate_weights, Phase, RebalanceCadence, ValuationMode, DAYS_PER_YEAR,
};
use crate::core::{Result, WealthError};

/// Rebalancing schedule, cash flows and inflation shared by every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPlan {
    /// Rebalancing cadence.
    pub cadence: RebalanceCadence,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Amount contributed or withdrawn at each boundary.
    pub cash_flow: f64,
    /// Annual inflation in percent (2.0 = 2%).
    pub annual_inflation_pct: f64,
}

impl Default for PortfolioPlan {
    fn default() -> Self {
        Self {
            cadence: RebalanceCadence::Monthly,
            phase: Phase::Accumulation,
            cash_flow: 0.0,
            annual_inflation_pct: 0.0,
        }
    }
}

impl PortfolioPlan {
    /// Daily inflation discount applied to real values.
    #[inline]
    pub fn daily_inflation(&self) -> f64 {
        (self.annual_inflation_pct / DAYS_PER_YEAR) / 100.0
    }

    /// Check the plan's scalar parameters.
    pub fn validate(&self) -> Result<()> {
        if self.cadence.periods() == 0 {
            return Err(WealthError::invalid_parameter(
                "rebalancing cadence must be at least one period",
            ));
        }
        if !self.cash_flow.is_finite() || self.cash_flow < 0.0 {
            return Err(WealthError::invalid_parameter(
                "cash flow must be a non-negative amount",
            ));
        }
        if !self.annual_inflation_pct.is_finite() {
            return Err(WealthError::invalid_parameter("inflation must be finite"));
        }
        Ok(())
    }
}

/// Result of evolving one return matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOutcome {
    /// Per-asset values in the final period.
    pub terminal: Vec<f64>,
    /// Portfolio total in every period.
    pub trajectory: Vec<f64>,
    /// Weights in force during the final period.
    pub final_weights: Vec<f64>,
    /// Number of rebalancing events.
    pub rebalances: usize,
}

impl EvolutionOutcome {
    /// Portfolio total in the final period.
    pub fn terminal_value(&self) -> f64 {
        self.terminal.iter().sum()
    }
}

/// Per-run evolver state.
///
/// One instance owns its weight vector; runs never share one.
#[derive(Debug, Clone)]
pub struct RebalancingEvolver {
    plan: PortfolioPlan,
    mode: ValuationMode,
    weights: Vec<f64>,
    capital: f64,
    previous: Vec<f64>,
    trajectory: Vec<f64>,
    rebalances: usize,
    period: usize,
}

impl RebalancingEvolver {
    /// Create an evolver starting from `initial_capital` split by `weights`.
    pub fn new(
        initial_capital: f64,
        weights: &[f64],
        plan: PortfolioPlan,
        mode: ValuationMode,
    ) -> Result<Self> {
        if weights.is_empty() {
            return Err(WealthError::invalid_parameter("asset count must be positive"));
        }
        validate_weights(weights, weights.len())?;
        plan.validate()?;
        if !initial_capital.is_finite() {
            return Err(WealthError::invalid_parameter("initial capital must be finite"));
        }
        Ok(Self {
            plan,
            mode,
            weights: weights.to_vec(),
            capital: initial_capital,
            previous: Vec::new(),
            trajectory: Vec::new(),
            rebalances: 0,
            period: 0,
        })
    }

    /// Current weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Capital available to the next period.
    #[inline]
    pub fn capital(&self) -> f64 {
        self.capital
    }

    /// Number of periods processed so far.
    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Portfolio totals recorded so far.
    #[inline]
    pub fn trajectory(&self) -> &[f64] {
        &self.trajectory
    }

    /// Advance one period given each asset's return for it.
    ///
    /// Returns the period's portfolio total.
    pub fn step(&mut self, returns: &[f64]) -> Result<f64> {
        if returns.len() != self.weights.len() {
            return Err(WealthError::length_mismatch(self.weights.len(), returns.len()));
        }

        let i = self.period;
        let boundary = self.plan.cadence.is_boundary(i);

        if boundary {
            self.rebalance(returns, i)?;
        }

        let inflation = match self.mode {
            ValuationMode::Real => self.plan.daily_inflation(),
            ValuationMode::Nominal => 0.0,
        };

        let values: Vec<f64> = returns
            .iter()
            .zip(&self.weights)
            .map(|(&r, &w)| {
                let value = (r + 1.0) * w * self.capital;
                match self.mode {
                    ValuationMode::Real => value - inflation * value,
                    ValuationMode::Nominal => value,
                }
            })
            .collect();

        let total: f64 = values.iter().sum();
        self.trajectory.push(total);

        self.capital = if boundary {
            total + self.plan.phase.signed(self.plan.cash_flow)
        } else {
            total
        };
        self.previous = values;
        self.period += 1;

        Ok(total)
    }

    fn rebalance(&mut self, returns: &[f64], period: usize) -> Result<()> {
        let projected: Vec<f64> = returns
            .iter()
            .zip(&self.previous)
            .map(|(&r, &prev)| (r + 1.0) * prev)
            .collect();
        let denominator: f64 = projected.iter().sum();
        if denominator == 0.0 || !denominator.is_finite() {
            return Err(WealthError::degenerate_rebalance(period));
        }
        for (w, p) in self.weights.iter_mut().zip(&projected) {
            *w = p / denominator;
        }
        self.rebalances += 1;
        Ok(())
    }

    /// Consume the evolver and report its final state.
    pub fn finish(self) -> Result<EvolutionOutcome> {
        if self.period == 0 {
            return Err(WealthError::empty_data("return series"));
        }
        Ok(EvolutionOutcome {
            terminal: self.previous,
            trajectory: self.trajectory,
            final_weights: self.weights,
            rebalances: self.rebalances,
        })
    }

    /// Walk every period of an asset-major return matrix.
    pub fn run(mut self, returns: &[Vec<f64>]) -> Result<EvolutionOutcome> {
        let num_periods = check_matrix(returns, self.weights.len())?;
        let mut column = vec![0.0; returns.len()];
        for i in 0..num_periods {
            for (slot, row) in column.iter_mut().zip(returns) {
                *slot = row[i];
            }
            self.step(&column)?;
        }
        self.finish()
    }
}

/// Evolve `initial_capital` over `returns` in one call.
pub fn evolve(
    initial_capital: f64,
    returns: &[Vec<f64>],
    weights: &[f64],
    plan: PortfolioPlan,
    mode: ValuationMode,
) -> Result<EvolutionOutcome> {
    RebalancingEvolver::new(initial_capital, weights, plan, mode)?.run(returns)
}

/// Period count of a rectangular matrix with `num_assets` rows.
fn check_matrix(returns: &[Vec<f64>], num_assets: usize) -> Result<usize> {
    if returns.len() != num_assets {
        return Err(WealthError::length_mismatch(num_assets, returns.len()));
    }
    let num_periods = returns[0].len();
    if num_periods == 0 {
        return Err(WealthError::empty_data("return series"));
    }
    if let Some(row) = returns.iter().find(|row| row.len() != num_periods) {
        return Err(WealthError::length_mismatch(num_periods, row.len()));
    }
    Ok(num_periods)
}
