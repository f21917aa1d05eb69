//! Monte Carlo simulation pipeline: price paths, returns and batch runs.

pub mod batch;
pub mod gbm;
pub mod returns;

pub use batch::{
    run_batch, run_batch_with_cancel, simulate, BatchResult, CancellationToken, SimulationConfig,
};
pub use gbm::{run_rng, GbmPathGenerator, PathRng};
pub use returns::to_returns;
