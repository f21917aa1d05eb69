// Suppress warning from PyO3 macro expansion (fixed in newer PyO3 versions)
#![allow(non_local_definitions)]

//! wealthmc - Monte Carlo projection of rebalanced portfolios.
//!
//! This crate provides:
//! - Per-asset return statistics from historical prices
//! - Geometric Brownian Motion price paths (Euler–Maruyama)
//! - Portfolio evolution with periodic rebalancing, cash flows and inflation
//! - Parallel, seeded, cancellable simulation batches with real and nominal results
//! - Batch summaries (mean, dispersion, best/worst, target probability)

pub mod core;
pub mod metrics;
pub mod portfolio;
#[cfg(feature = "python")]
pub mod python;
pub mod simulation;

pub use crate::core::{PriceHistory, Result, WealthError};
pub use crate::simulation::{run_batch, BatchResult, SimulationConfig};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn _wealthmc(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<python::bindings::PySimulationConfig>()?;
    m.add_class::<python::bindings::PyBatchResult>()?;

    m.add_function(wrap_pyfunction!(python::bindings::run_batch, m)?)?;

    Ok(())
}
