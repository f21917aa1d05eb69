//! Error types for wealthmc.

use thiserror::Error;

/// Result type alias for wealthmc operations.
pub type Result<T> = std::result::Result<T, WealthError>;

/// Error types for the simulation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WealthError {
    /// Price history too short to estimate returns or volatility.
    #[error("Insufficient data: need at least {required} rows, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Invalid parameter value.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Rebalancing denominator collapsed to zero.
    #[error("Degenerate rebalance at period {period}: projected asset values sum to zero")]
    DegenerateRebalance { period: usize },

    /// A single simulation run failed; the batch is aborted.
    #[error("Simulation run {run} failed: {source}")]
    RunFailure {
        run: usize,
        #[source]
        source: Box<WealthError>,
    },

    /// Data length mismatch between arrays.
    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Empty data error.
    #[error("Empty data provided for {context}")]
    EmptyData { context: String },

    /// Batch stopped through its cancellation token.
    #[error("Simulation batch cancelled")]
    Cancelled,
}

impl WealthError {
    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a degenerate rebalance error.
    pub fn degenerate_rebalance(period: usize) -> Self {
        Self::DegenerateRebalance { period }
    }

    /// Wrap an error with the index of the run that produced it.
    pub fn run_failure(run: usize, source: WealthError) -> Self {
        Self::RunFailure {
            run,
            source: Box::new(source),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an empty data error.
    pub fn empty_data(context: impl Into<String>) -> Self {
        Self::EmptyData {
            context: context.into(),
        }
    }

    /// Innermost error, unwrapping any `RunFailure` layers.
    pub fn root_cause(&self) -> &WealthError {
        match self {
            Self::RunFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(feature = "python")]
impl From<WealthError> for pyo3::PyErr {
    fn from(err: WealthError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
