//! Portfolio evolution for wealthmc.

pub mod allocation;
pub mod rebalance;

pub use allocation::AllocationStrategy;
pub use rebalance::{evolve, EvolutionOutcome, PortfolioPlan, RebalancingEvolver};
