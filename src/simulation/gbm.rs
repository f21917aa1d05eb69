//! Geometric Brownian Motion price paths.
//!
//! Paths follow the explicit Euler–Maruyama discretization of
//! `dS = mu S dt + sigma S dW`:
//!
//! ```text
//! S[i] = S[i-1] + mu * S[i-1] * dt + sigma * S[i-1] * sqrt(dt) * z[i],   z[i] ~ N(0, 1)
//! ```
//!
//! Unlike the exact lognormal solution `S0 exp((mu - sigma^2/2) t + sigma W_t)`,
//! this scheme carries an O(dt) bias and can step a price to zero or below when
//! `sigma * sqrt(dt) * z < -1 - mu * dt`. With daily steps and ordinary equity
//! volatilities that needs draws many standard deviations out.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::StandardNormal;

use crate::core::types::{AssetMatrix, DAYS_PER_YEAR};
use crate::core::{Result, WealthError};
use crate::metrics::estimator::MarketParameters;

/// Random stream used for one simulation run.
pub type PathRng = ChaCha20Rng;

/// Golden-ratio increment separating per-run seeds.
const SEED_STRIDE: u64 = 0x9e3779b97f4a7c15;

/// Independent random stream for run `run` of a batch seeded with `seed`.
pub fn run_rng(seed: u64, run: u64) -> PathRng {
    ChaCha20Rng::seed_from_u64(seed.wrapping_add(run.wrapping_mul(SEED_STRIDE)))
}

/// Upper bound on grid points per path.
pub const MAX_STEPS: usize = 10_000_000;

/// Number of grid points for a horizon: `floor(horizon / dt) + 1`.
pub fn num_steps(horizon_years: f64, dt: f64) -> Result<usize> {
    validate_grid(horizon_years, dt)?;
    // Guards 1 / (1/365) style quotients that land a hair under an integer.
    let intervals = (horizon_years / dt + 1e-9).floor();
    if intervals >= MAX_STEPS as f64 {
        return Err(WealthError::invalid_parameter(format!(
            "horizon {horizon_years} with time step {dt} exceeds {MAX_STEPS} grid points"
        )));
    }
    Ok(intervals as usize + 1)
}

fn validate_grid(horizon_years: f64, dt: f64) -> Result<()> {
    if !(horizon_years.is_finite() && horizon_years > 0.0) {
        return Err(WealthError::invalid_parameter(format!(
            "horizon must be positive, got {horizon_years}"
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(WealthError::invalid_parameter(format!(
            "time step must be positive, got {dt}"
        )));
    }
    Ok(())
}

/// Euler–Maruyama GBM path generator over a fixed time grid.
#[derive(Debug, Clone, Copy)]
pub struct GbmPathGenerator {
    horizon_years: f64,
    dt: f64,
    steps: usize,
}

impl GbmPathGenerator {
    /// Generator over `[0, horizon_years]` with daily steps.
    pub fn new(horizon_years: f64) -> Result<Self> {
        Self::with_dt(horizon_years, 1.0 / DAYS_PER_YEAR)
    }

    /// Generator with an explicit time step.
    pub fn with_dt(horizon_years: f64, dt: f64) -> Result<Self> {
        let steps = num_steps(horizon_years, dt)?;
        Ok(Self {
            horizon_years,
            dt,
            steps,
        })
    }

    /// Horizon in years.
    #[inline]
    pub fn horizon_years(&self) -> f64 {
        self.horizon_years
    }

    /// Time step in years.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of grid points, including `t = 0`.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.steps
    }

    /// Time of every grid point.
    pub fn times(&self) -> Vec<f64> {
        if self.steps == 1 {
            return vec![0.0];
        }
        let last = (self.steps - 1) as f64;
        (0..self.steps)
            .map(|i| self.horizon_years * i as f64 / last)
            .collect()
    }

    /// Simulate one price path per asset.
    ///
    /// Draws are consumed asset by asset, so a given stream always yields
    /// the same matrix.
    pub fn generate<R: Rng>(
        &self,
        params: &MarketParameters,
        rng: &mut R,
    ) -> Result<AssetMatrix> {
        validate_params(params)?;

        let sqrt_dt = self.dt.sqrt();
        let mut paths = Vec::with_capacity(params.len());

        for ((&mu, &sigma), &s0) in params.mu.iter().zip(&params.sigma).zip(&params.s0) {
            let mut path = Vec::with_capacity(self.steps);
            path.push(s0);
            let mut price = s0;
            for _ in 1..self.steps {
                let z: f64 = rng.sample(StandardNormal);
                let drift = mu * price * self.dt;
                let diffusion = sigma * price * sqrt_dt * z;
                price = price + drift + diffusion;
                path.push(price);
            }
            paths.push(path);
        }

        Ok(paths)
    }
}

fn validate_params(params: &MarketParameters) -> Result<()> {
    if params.is_empty() {
        return Err(WealthError::invalid_parameter("asset count must be positive"));
    }
    if params.mu.len() != params.len() {
        return Err(WealthError::length_mismatch(params.len(), params.mu.len()));
    }
    if params.sigma.len() != params.len() {
        return Err(WealthError::length_mismatch(params.len(), params.sigma.len()));
    }
    let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
    if !finite(&params.mu) || !finite(&params.sigma) || !finite(&params.s0) {
        return Err(WealthError::invalid_parameter(
            "drift, volatility and initial price must be finite",
        ));
    }
    if params.sigma.iter().any(|&s| s < 0.0) {
        return Err(WealthError::invalid_parameter("volatility must be non-negative"));
    }
    Ok(())
}
