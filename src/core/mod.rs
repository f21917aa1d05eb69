//! Core types and utilities for wealthmc.

pub mod error;
pub mod timeseries;
pub mod types;

pub use error::{Result, WealthError};
pub use timeseries::PriceHistory;
pub use types::*;
