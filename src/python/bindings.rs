//! PyO3 function bindings for wealthmc.

use numpy::{PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::timeseries::PriceHistory;
use crate::core::types::{DriftMode, Phase, RebalanceCadence, ValuationMode};
use crate::metrics::summary::{BatchSummary, ColumnStats};
use crate::simulation::batch::{self, BatchResult, SimulationConfig};

use super::numpy_bridge::*;

// ============================================================================
// Configuration Classes
// ============================================================================

/// Python-exposed simulation configuration.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PySimulationConfig {
    #[pyo3(get, set)]
    pub horizon_years: f64,
    #[pyo3(get, set)]
    pub assets: Vec<String>,
    #[pyo3(get, set)]
    pub initial_capital: f64,
    #[pyo3(get, set)]
    pub weights: Option<Vec<f64>>,
    #[pyo3(get, set)]
    pub num_simulations: usize,
    #[pyo3(get, set)]
    pub phase_cashflow: f64,
    #[pyo3(get, set)]
    pub annual_inflation_pct: f64,
    #[pyo3(get, set)]
    pub seed: u64,
    cadence: RebalanceCadence,
    phase: Phase,
    drift_mode: DriftMode,
}

#[pymethods]
impl PySimulationConfig {
    #[new]
    #[pyo3(signature = (assets, horizon_years=1.0, initial_capital=1000.0, weights=None, num_simulations=10, rebalance="monthly", phase="accumulation", phase_cashflow=0.0, annual_inflation_pct=2.0, seed=42))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        assets: Vec<String>,
        horizon_years: f64,
        initial_capital: f64,
        weights: Option<Vec<f64>>,
        num_simulations: usize,
        rebalance: &str,
        phase: &str,
        phase_cashflow: f64,
        annual_inflation_pct: f64,
        seed: u64,
    ) -> PyResult<Self> {
        Ok(Self {
            horizon_years,
            assets,
            initial_capital,
            weights,
            num_simulations,
            phase_cashflow,
            annual_inflation_pct,
            seed,
            cadence: parse_cadence(rebalance)?,
            phase: parse_phase(phase)?,
            drift_mode: DriftMode::default(),
        })
    }

    /// Rebalance every `periods` days instead of a named cadence.
    fn set_custom_cadence(&mut self, periods: usize) {
        self.cadence = RebalanceCadence::Custom(periods);
    }

    /// Annualize drift and volatility from one asset for all of them.
    fn set_broadcast_drift(&mut self, asset_index: usize) {
        self.drift_mode = DriftMode::Broadcast { asset_index };
    }

    /// Give every asset its own drift and volatility.
    fn set_per_asset_drift(&mut self) {
        self.drift_mode = DriftMode::PerAsset;
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(assets={:?}, horizon={}y, runs={}, cadence={:?}, phase={:?})",
            self.assets, self.horizon_years, self.num_simulations, self.cadence, self.phase
        )
    }
}

impl From<&PySimulationConfig> for SimulationConfig {
    fn from(py_config: &PySimulationConfig) -> Self {
        let mut config = SimulationConfig::new(py_config.assets.clone())
            .with_horizon(py_config.horizon_years)
            .with_initial_capital(py_config.initial_capital)
            .with_simulations(py_config.num_simulations)
            .with_cadence(py_config.cadence)
            .with_phase(py_config.phase, py_config.phase_cashflow)
            .with_inflation(py_config.annual_inflation_pct)
            .with_seed(py_config.seed)
            .with_drift_mode(py_config.drift_mode);
        if let Some(weights) = &py_config.weights {
            config.weights = weights.clone();
        }
        config
    }
}

fn parse_cadence(name: &str) -> PyResult<RebalanceCadence> {
    RebalanceCadence::from_name(name).ok_or_else(|| {
        pyo3::exceptions::PyValueError::new_err(format!(
            "Invalid rebalance cadence: {}. Use 'monthly', 'quarterly', 'semiannual' or 'annual'",
            name
        ))
    })
}

fn parse_phase(name: &str) -> PyResult<Phase> {
    Phase::from_name(name).ok_or_else(|| {
        pyo3::exceptions::PyValueError::new_err(format!(
            "Invalid phase: {}. Use 'accumulation' or 'distribution'",
            name
        ))
    })
}

// ============================================================================
// Result Classes
// ============================================================================

/// Python-exposed batch result.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyBatchResult {
    inner: BatchResult,
}

#[pymethods]
impl PyBatchResult {
    /// Asset symbols in column order.
    #[getter]
    fn assets(&self) -> Vec<String> {
        self.inner.assets.clone()
    }

    /// Number of runs.
    #[getter]
    fn num_runs(&self) -> usize {
        self.inner.num_runs()
    }

    /// Real terminal values as a (runs, assets) array.
    fn terminal_real<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray2<f64>> {
        matrix_to_numpy_f64(py, &self.inner.terminal_real)
    }

    /// Nominal terminal values as a (runs, assets) array.
    fn terminal_nominal<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray2<f64>> {
        matrix_to_numpy_f64(py, &self.inner.terminal_nominal)
    }

    /// Real trajectories, one array per run.
    fn trajectory_real<'py>(&self, py: Python<'py>) -> Vec<&'py PyArray1<f64>> {
        trajectories(py, &self.inner.trajectory_real)
    }

    /// Nominal trajectories, one array per run.
    fn trajectory_nominal<'py>(&self, py: Python<'py>) -> Vec<&'py PyArray1<f64>> {
        trajectories(py, &self.inner.trajectory_nominal)
    }

    /// Summary statistics as a dictionary keyed by asset, plus "Total".
    #[pyo3(signature = (real=true, target=None))]
    fn summary(&self, py: Python, real: bool, target: Option<f64>) -> PyResult<PyObject> {
        let summary = self.inner.summary(mode(real), target)?;
        summary_to_dict(py, &self.inner.assets, &summary)
    }

    /// Long-format trajectory table as a dict of columns.
    #[pyo3(signature = (real=true))]
    fn period_records(&self, py: Python, real: bool) -> PyResult<PyObject> {
        let records = self.inner.period_records(mode(real));
        let dict = PyDict::new(py);
        dict.set_item(
            "simulation",
            records.iter().map(|r| r.simulation).collect::<Vec<_>>(),
        )?;
        dict.set_item("period", records.iter().map(|r| r.period).collect::<Vec<_>>())?;
        dict.set_item("value", records.iter().map(|r| r.value).collect::<Vec<_>>())?;
        Ok(dict.into())
    }

    fn __repr__(&self) -> String {
        let mean_real = self
            .inner
            .summary(ValuationMode::Real, None)
            .map_or(f64::NAN, |summary| summary.total.mean);
        format!(
            "BatchResult(runs={}, assets={}, mean_real={:.2})",
            self.inner.num_runs(),
            self.inner.assets.len(),
            mean_real
        )
    }
}

fn mode(real: bool) -> ValuationMode {
    if real {
        ValuationMode::Real
    } else {
        ValuationMode::Nominal
    }
}

fn trajectories<'py>(py: Python<'py>, paths: &[Vec<f64>]) -> Vec<&'py PyArray1<f64>> {
    paths
        .iter()
        .map(|path| vec_to_numpy_f64(py, path.clone()))
        .collect()
}

fn stats_to_dict<'py>(py: Python<'py>, stats: &ColumnStats) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("mean", stats.mean)?;
    dict.set_item("std", stats.std)?;
    dict.set_item("best", stats.best)?;
    dict.set_item("worst", stats.worst)?;
    Ok(dict)
}

fn summary_to_dict(py: Python, assets: &[String], summary: &BatchSummary) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    for (symbol, stats) in assets.iter().zip(&summary.per_asset) {
        dict.set_item(symbol, stats_to_dict(py, stats)?)?;
    }
    dict.set_item("Total", stats_to_dict(py, &summary.total)?)?;
    dict.set_item("runs", summary.runs)?;
    if let Some(p) = summary.target_probability_pct {
        dict.set_item("target_probability_pct", p)?;
    }
    Ok(dict.into())
}

// ============================================================================
// Simulation Functions
// ============================================================================

/// Run a Monte Carlo batch from historical price columns.
///
/// `prices` holds one array per symbol, all of equal length, oldest first.
#[pyfunction]
#[pyo3(signature = (prices, symbols, config, timestamps=None))]
pub fn run_batch(
    py: Python<'_>,
    prices: Vec<PyReadonlyArray1<f64>>,
    symbols: Vec<String>,
    config: &PySimulationConfig,
    timestamps: Option<PyReadonlyArray1<i64>>,
) -> PyResult<PyBatchResult> {
    let columns: Vec<Vec<f64>> = prices.iter().map(numpy_to_vec_f64).collect();
    let history = match timestamps {
        Some(ts) => PriceHistory::new(numpy_to_vec_i64(&ts), symbols, columns)?,
        None => PriceHistory::from_columns(symbols, columns)?,
    };
    let config = SimulationConfig::from(config);

    let inner = py.allow_threads(|| batch::run_batch(&history, &config))?;
    Ok(PyBatchResult { inner })
}
