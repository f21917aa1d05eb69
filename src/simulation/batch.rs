//! Batch orchestration: many independent simulation runs, aggregated.
//!
//! Each run draws a fresh GBM path from its own seeded stream, converts it
//! to returns and evolves the portfolio twice, once per valuation mode. Runs
//! execute on the Rayon pool and are collected in run order, so a fixed seed
//! reproduces the batch bit for bit regardless of thread count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::timeseries::PriceHistory;
use crate::core::types::{
    validate_weights, AssetMatrix, DriftMode, PeriodRecord, Phase, RebalanceCadence,
    ValuationMode, DAYS_PER_YEAR,
};
use crate::core::{Result, WealthError};
use crate::metrics::estimator::{estimate_for, MarketParameters};
use crate::metrics::summary::{summarize, BatchSummary};
use crate::portfolio::allocation::AllocationStrategy;
use crate::portfolio::rebalance::{PortfolioPlan, RebalancingEvolver};

use super::gbm::{run_rng, GbmPathGenerator};
use super::returns::to_returns;

/// Configuration for a simulation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated horizon in years.
    pub horizon_years: f64,
    /// Symbols to simulate, in portfolio order.
    pub assets: Vec<String>,
    /// Capital invested at the start.
    pub initial_capital: f64,
    /// Initial weight per asset, summing to 1.
    pub weights: Vec<f64>,
    /// Number of independent runs.
    pub num_simulations: usize,
    /// Rebalancing cadence.
    pub cadence: RebalanceCadence,
    /// Accumulation or distribution.
    pub phase: Phase,
    /// Amount contributed or withdrawn at each rebalancing boundary.
    pub phase_cashflow: f64,
    /// Annual inflation in percent.
    pub annual_inflation_pct: f64,
    /// Base seed; run `k` uses a stream derived from it.
    pub seed: u64,
    /// How drift and volatility reach the path generator.
    pub drift_mode: DriftMode,
    /// Time step in years.
    pub dt: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_years: 1.0,
            assets: Vec::new(),
            initial_capital: 1000.0,
            weights: Vec::new(),
            num_simulations: 10,
            cadence: RebalanceCadence::Monthly,
            phase: Phase::Accumulation,
            phase_cashflow: 0.0,
            annual_inflation_pct: 2.0,
            seed: 42,
            drift_mode: DriftMode::default(),
            dt: 1.0 / DAYS_PER_YEAR,
        }
    }
}

impl SimulationConfig {
    /// Equal-weight configuration over `assets`, other fields at defaults.
    pub fn new(assets: Vec<String>) -> Self {
        let weights = AllocationStrategy::EqualWeight
            .weights(assets.len())
            .unwrap_or_default();
        Self {
            assets,
            weights,
            ..Default::default()
        }
    }

    /// Set the horizon in years.
    pub fn with_horizon(mut self, years: f64) -> Self {
        self.horizon_years = years;
        self
    }

    /// Set the initial capital.
    pub fn with_initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = capital;
        self
    }

    /// Set the weights from an allocation strategy.
    pub fn with_allocation(mut self, allocation: &AllocationStrategy) -> Result<Self> {
        self.weights = allocation.weights(self.assets.len())?;
        Ok(self)
    }

    /// Set the number of runs.
    pub fn with_simulations(mut self, n: usize) -> Self {
        self.num_simulations = n;
        self
    }

    /// Set the rebalancing cadence.
    pub fn with_cadence(mut self, cadence: RebalanceCadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the phase and its per-boundary cash flow.
    pub fn with_phase(mut self, phase: Phase, cashflow: f64) -> Self {
        self.phase = phase;
        self.phase_cashflow = cashflow;
        self
    }

    /// Set annual inflation in percent.
    pub fn with_inflation(mut self, pct: f64) -> Self {
        self.annual_inflation_pct = pct;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the drift mode.
    pub fn with_drift_mode(mut self, mode: DriftMode) -> Self {
        self.drift_mode = mode;
        self
    }

    /// Set the time step.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Rebalancing, cash-flow and inflation settings.
    pub fn plan(&self) -> PortfolioPlan {
        PortfolioPlan {
            cadence: self.cadence,
            phase: self.phase,
            cash_flow: self.phase_cashflow,
            annual_inflation_pct: self.annual_inflation_pct,
        }
    }

    /// Check every parameter before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            return Err(WealthError::invalid_parameter("at least one asset is required"));
        }
        validate_weights(&self.weights, self.assets.len())?;
        if self.num_simulations == 0 {
            return Err(WealthError::invalid_parameter(
                "number of simulations must be positive",
            ));
        }
        if !self.initial_capital.is_finite() {
            return Err(WealthError::invalid_parameter("initial capital must be finite"));
        }
        GbmPathGenerator::with_dt(self.horizon_years, self.dt)?;
        self.plan().validate()
    }
}

/// Shared flag that stops a running batch between runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Aggregated output of a batch.
///
/// Terminal matrices are run-major: one row per run, one column per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Asset symbols, in column order.
    pub assets: Vec<String>,
    /// Inflation-adjusted per-asset terminal values.
    pub terminal_real: AssetMatrix,
    /// Inflation-adjusted portfolio totals per period.
    pub trajectory_real: Vec<Vec<f64>>,
    /// Unadjusted per-asset terminal values.
    pub terminal_nominal: AssetMatrix,
    /// Unadjusted portfolio totals per period.
    pub trajectory_nominal: Vec<Vec<f64>>,
}

impl BatchResult {
    /// Number of runs.
    #[inline]
    pub fn num_runs(&self) -> usize {
        self.terminal_real.len()
    }

    /// Terminal matrix for a valuation mode.
    pub fn terminal(&self, mode: ValuationMode) -> &[Vec<f64>] {
        match mode {
            ValuationMode::Real => &self.terminal_real,
            ValuationMode::Nominal => &self.terminal_nominal,
        }
    }

    /// Trajectories for a valuation mode.
    pub fn trajectories(&self, mode: ValuationMode) -> &[Vec<f64>] {
        match mode {
            ValuationMode::Real => &self.trajectory_real,
            ValuationMode::Nominal => &self.trajectory_nominal,
        }
    }

    /// Per-asset and total statistics, with the chance of beating `target`.
    pub fn summary(&self, mode: ValuationMode, target: Option<f64>) -> Result<BatchSummary> {
        summarize(self.terminal(mode), target)
    }

    /// Trajectories flattened into 1-based (simulation, period, value) records.
    pub fn period_records(&self, mode: ValuationMode) -> Vec<PeriodRecord> {
        self.trajectories(mode)
            .iter()
            .enumerate()
            .flat_map(|(run, path)| {
                path.iter().enumerate().map(move |(period, &value)| PeriodRecord {
                    simulation: run + 1,
                    period: period + 1,
                    value,
                })
            })
            .collect()
    }
}

struct RunOutput {
    terminal_real: Vec<f64>,
    trajectory_real: Vec<f64>,
    terminal_nominal: Vec<f64>,
    trajectory_nominal: Vec<f64>,
}

/// Estimate market parameters from `history` and run the batch.
pub fn run_batch(history: &PriceHistory, config: &SimulationConfig) -> Result<BatchResult> {
    run_batch_with_cancel(history, config, &CancellationToken::new())
}

/// [`run_batch`] with a cancellation token checked before every run.
///
/// A token set while the batch runs yields [`WealthError::Cancelled`], even
/// if some run has failed meanwhile. A token set after the last run finished
/// leaves a complete result untouched.
pub fn run_batch_with_cancel(
    history: &PriceHistory,
    config: &SimulationConfig,
    token: &CancellationToken,
) -> Result<BatchResult> {
    config.validate()?;
    let metrics = estimate_for(history, &config.assets)?;
    let params = MarketParameters::from_metrics(&metrics, config.drift_mode)?;
    simulate_validated(&params, config, token)
}

/// Run the batch from already calibrated market parameters.
pub fn simulate(
    params: &MarketParameters,
    config: &SimulationConfig,
    token: &CancellationToken,
) -> Result<BatchResult> {
    config.validate()?;
    simulate_validated(params, config, token)
}

fn simulate_validated(
    params: &MarketParameters,
    config: &SimulationConfig,
    token: &CancellationToken,
) -> Result<BatchResult> {
    if params.len() != config.assets.len() {
        return Err(WealthError::length_mismatch(config.assets.len(), params.len()));
    }

    let generator = GbmPathGenerator::with_dt(config.horizon_years, config.dt)?;
    let plan = config.plan();

    info!(
        runs = config.num_simulations,
        assets = params.len(),
        steps = generator.num_steps(),
        seed = config.seed,
        "starting simulation batch"
    );

    let outputs = (0..config.num_simulations)
        .into_par_iter()
        .map(|run| {
            if token.is_cancelled() {
                return Err(WealthError::Cancelled);
            }
            let output = simulate_run(run, params, config, &generator, plan)
                .map_err(|e| WealthError::run_failure(run, e))?;
            debug!(
                run,
                terminal_real = output.trajectory_real.last().copied().unwrap_or_default(),
                terminal_nominal = output.trajectory_nominal.last().copied().unwrap_or_default(),
                "run complete"
            );
            Ok(output)
        })
        .collect::<Result<Vec<RunOutput>>>();
    let outputs = settle_cancellation(outputs, token)?;

    let mut result = BatchResult {
        assets: config.assets.clone(),
        terminal_real: Vec::with_capacity(outputs.len()),
        trajectory_real: Vec::with_capacity(outputs.len()),
        terminal_nominal: Vec::with_capacity(outputs.len()),
        trajectory_nominal: Vec::with_capacity(outputs.len()),
    };
    for output in outputs {
        result.terminal_real.push(output.terminal_real);
        result.trajectory_real.push(output.trajectory_real);
        result.terminal_nominal.push(output.terminal_nominal);
        result.trajectory_nominal.push(output.trajectory_nominal);
    }

    info!(runs = result.num_runs(), "simulation batch complete");
    Ok(result)
}

/// A failed batch under a set token reports cancellation.
fn settle_cancellation<T>(outcome: Result<T>, token: &CancellationToken) -> Result<T> {
    match outcome {
        Err(_) if token.is_cancelled() => Err(WealthError::Cancelled),
        other => other,
    }
}

fn simulate_run(
    run: usize,
    params: &MarketParameters,
    config: &SimulationConfig,
    generator: &GbmPathGenerator,
    plan: PortfolioPlan,
) -> Result<RunOutput> {
    let mut rng = run_rng(config.seed, run as u64);
    let prices = generator.generate(params, &mut rng)?;
    let returns = to_returns(&prices)?;

    let real = RebalancingEvolver::new(
        config.initial_capital,
        &config.weights,
        plan,
        ValuationMode::Real,
    )?
    .run(&returns)?;
    let nominal = RebalancingEvolver::new(
        config.initial_capital,
        &config.weights,
        plan,
        ValuationMode::Nominal,
    )?
    .run(&returns)?;

    Ok(RunOutput {
        terminal_real: real.terminal,
        trajectory_real: real.trajectory,
        terminal_nominal: nominal.terminal,
        trajectory_nominal: nominal.trajectory,
    })
}
