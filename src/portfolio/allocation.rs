//! Initial capital allocation across assets.

use serde::{Deserialize, Serialize};

use crate::core::types::validate_weights;
use crate::core::{Result, WealthError};

/// How the initial capital is split between assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocationStrategy {
    /// Equal weight across all assets.
    EqualWeight,
    /// Fixed weight for each asset, in asset order. Must sum to 1.
    FixedWeight(Vec<f64>),
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::EqualWeight
    }
}

impl AllocationStrategy {
    /// Concrete weight vector for `num_assets` assets.
    pub fn weights(&self, num_assets: usize) -> Result<Vec<f64>> {
        if num_assets == 0 {
            return Err(WealthError::invalid_parameter("asset count must be positive"));
        }
        match self {
            AllocationStrategy::EqualWeight => Ok(vec![1.0 / num_assets as f64; num_assets]),
            AllocationStrategy::FixedWeight(weights) => {
                validate_weights(weights, num_assets)?;
                Ok(weights.clone())
            }
        }
    }
}
