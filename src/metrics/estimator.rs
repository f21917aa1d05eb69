//! Per-asset return statistics estimated from historical prices.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::timeseries::{median, pct_change, sample_std, PriceHistory};
use crate::core::types::{DriftMode, DAYS_PER_YEAR};
use crate::core::{Result, WealthError};

/// Daily statistics per asset, index-aligned with the history's symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetrics {
    /// Asset symbols.
    pub symbols: Vec<String>,
    /// Median daily percentage change.
    pub expected_return: Vec<f64>,
    /// Sample standard deviation of daily percentage changes.
    pub volatility: Vec<f64>,
    /// Final observed price.
    pub last_price: Vec<f64>,
}

impl AssetMetrics {
    /// Number of assets.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Annualized generator inputs for each asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    /// Annual drift per asset.
    pub mu: Vec<f64>,
    /// Annual volatility per asset.
    pub sigma: Vec<f64>,
    /// Initial price per asset.
    pub s0: Vec<f64>,
}

impl MarketParameters {
    /// Create parameters, checking that all vectors line up.
    pub fn new(mu: Vec<f64>, sigma: Vec<f64>, s0: Vec<f64>) -> Result<Self> {
        if mu.len() != s0.len() {
            return Err(WealthError::length_mismatch(s0.len(), mu.len()));
        }
        if sigma.len() != s0.len() {
            return Err(WealthError::length_mismatch(s0.len(), sigma.len()));
        }
        Ok(Self { mu, sigma, s0 })
    }

    /// Same scalar drift and volatility for every initial price.
    pub fn broadcast(mu: f64, sigma: f64, s0: Vec<f64>) -> Self {
        let n = s0.len();
        Self {
            mu: vec![mu; n],
            sigma: vec![sigma; n],
            s0,
        }
    }

    /// Annualize estimated daily statistics according to `mode`.
    ///
    /// Drift compounds the daily figure over a year; volatility scales with
    /// the square root of time.
    pub fn from_metrics(metrics: &AssetMetrics, mode: DriftMode) -> Result<Self> {
        if metrics.is_empty() {
            return Err(WealthError::empty_data("asset metrics"));
        }
        let s0 = metrics.last_price.clone();
        match mode {
            DriftMode::Broadcast { asset_index } => {
                if asset_index >= metrics.len() {
                    return Err(WealthError::invalid_parameter(format!(
                        "drift asset index {asset_index} out of range for {} assets",
                        metrics.len()
                    )));
                }
                Ok(Self::broadcast(
                    annualize_return(metrics.expected_return[asset_index]),
                    annualize_volatility(metrics.volatility[asset_index]),
                    s0,
                ))
            }
            DriftMode::PerAsset => Ok(Self {
                mu: metrics
                    .expected_return
                    .iter()
                    .map(|&r| annualize_return(r))
                    .collect(),
                sigma: metrics
                    .volatility
                    .iter()
                    .map(|&v| annualize_volatility(v))
                    .collect(),
                s0,
            }),
        }
    }

    /// Number of assets.
    #[inline]
    pub fn len(&self) -> usize {
        self.s0.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.s0.is_empty()
    }
}

/// Compound a daily return into an annual one.
#[inline]
pub fn annualize_return(daily: f64) -> f64 {
    (1.0 + daily).powf(DAYS_PER_YEAR) - 1.0
}

/// Scale a daily volatility to an annual one.
#[inline]
pub fn annualize_volatility(daily: f64) -> f64 {
    daily * DAYS_PER_YEAR.sqrt()
}

/// Estimate median return, volatility and last price for every column.
pub fn estimate(history: &PriceHistory) -> Result<AssetMetrics> {
    if history.len() < 2 {
        return Err(WealthError::insufficient_data(2, history.len()));
    }
    if history.num_assets() == 0 {
        return Err(WealthError::empty_data("price history"));
    }

    let mut expected_return = Vec::with_capacity(history.num_assets());
    let mut volatility = Vec::with_capacity(history.num_assets());
    let mut last_price = Vec::with_capacity(history.num_assets());

    for (symbol, column) in history.symbols.iter().zip(&history.columns) {
        let changes: Vec<f64> = pct_change(column).into_iter().flatten().collect();
        if changes.is_empty() {
            return Err(WealthError::insufficient_data(2, 0));
        }

        let std = if changes.len() < 2 {
            warn!(
                symbol = symbol.as_str(),
                "single price change available, volatility set to zero"
            );
            0.0
        } else {
            sample_std(&changes)
        };

        expected_return.push(median(&changes));
        volatility.push(std);
        last_price.push(column[column.len() - 1]);
    }

    Ok(AssetMetrics {
        symbols: history.symbols.clone(),
        expected_return,
        volatility,
        last_price,
    })
}

/// Estimate metrics for `symbols`, in the given order.
pub fn estimate_for(history: &PriceHistory, symbols: &[String]) -> Result<AssetMetrics> {
    estimate(&history.select(symbols)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(columns: Vec<Vec<f64>>) -> PriceHistory {
        let symbols = (0..columns.len()).map(|i| format!("S{i}")).collect();
        PriceHistory::from_columns(symbols, columns).unwrap()
    }

    #[test]
    fn test_estimate_basic() {
        let h = history(vec![
            vec![100.0, 110.0, 99.0, 108.9],
            vec![50.0, 50.0, 50.0, 50.0],
        ]);
        let metrics = estimate(&h).unwrap();

        // Changes: +10%, -10%, +10% -> median 10%
        assert!((metrics.expected_return[0] - 0.1).abs() < 1e-10);
        assert!((metrics.last_price[0] - 108.9).abs() < 1e-12);
        let expected_std = sample_std(&[0.1, -0.1, 0.1]);
        assert!((metrics.volatility[0] - expected_std).abs() < 1e-12);

        assert_eq!(metrics.expected_return[1], 0.0);
        assert_eq!(metrics.volatility[1], 0.0);
        assert_eq!(metrics.last_price[1], 50.0);
    }

    #[test]
    fn test_insufficient_rows() {
        let h = history(vec![vec![100.0]]);
        assert_eq!(
            estimate(&h),
            Err(WealthError::InsufficientData {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_two_rows_zero_volatility() {
        let h = history(vec![vec![100.0, 105.0]]);
        let metrics = estimate(&h).unwrap();
        assert!((metrics.expected_return[0] - 0.05).abs() < 1e-12);
        assert_eq!(metrics.volatility[0], 0.0);
    }

    #[test]
    fn test_nan_prices_forward_filled() {
        let h = history(vec![vec![100.0, f64::NAN, 100.0, 110.0, 121.0]]);
        let metrics = estimate(&h).unwrap();
        // The gap reads as 100: changes 0, 0, 0.1, 0.1.
        let expected_std = sample_std(&[0.0, 0.0, 0.1, 0.1]);
        assert!((metrics.expected_return[0] - 0.05).abs() < 1e-12);
        assert!((metrics.volatility[0] - expected_std).abs() < 1e-12);
        assert!((metrics.volatility[0] - 0.057735).abs() < 1e-6);
    }

    #[test]
    fn test_leading_nans_undefined() {
        let h = history(vec![vec![f64::NAN, f64::NAN, 100.0, 105.0]]);
        let metrics = estimate(&h).unwrap();
        assert!((metrics.expected_return[0] - 0.05).abs() < 1e-12);
        assert_eq!(metrics.volatility[0], 0.0);
    }

    #[test]
    fn test_broadcast_uses_selected_asset() {
        let metrics = AssetMetrics {
            symbols: vec!["A".into(), "B".into()],
            expected_return: vec![0.001, 0.002],
            volatility: vec![0.01, 0.02],
            last_price: vec![10.0, 20.0],
        };
        let params = MarketParameters::from_metrics(&metrics, DriftMode::default()).unwrap();
        let mu = 1.001_f64.powf(365.0) - 1.0;
        let sigma = 0.01 * 365.0_f64.sqrt();
        assert_eq!(params.mu, vec![mu, mu]);
        assert_eq!(params.sigma, vec![sigma, sigma]);
        assert_eq!(params.s0, vec![10.0, 20.0]);

        let second =
            MarketParameters::from_metrics(&metrics, DriftMode::Broadcast { asset_index: 1 })
                .unwrap();
        assert!((second.mu[0] - (1.002_f64.powf(365.0) - 1.0)).abs() < 1e-12);

        assert!(
            MarketParameters::from_metrics(&metrics, DriftMode::Broadcast { asset_index: 2 })
                .is_err()
        );
    }

    #[test]
    fn test_per_asset() {
        let metrics = AssetMetrics {
            symbols: vec!["A".into(), "B".into()],
            expected_return: vec![0.0, 0.001],
            volatility: vec![0.0, 0.02],
            last_price: vec![10.0, 20.0],
        };
        let params = MarketParameters::from_metrics(&metrics, DriftMode::PerAsset).unwrap();
        assert_eq!(params.mu[0], 0.0);
        assert_eq!(params.sigma[0], 0.0);
        assert!((params.sigma[1] - 0.02 * 365.0_f64.sqrt()).abs() < 1e-12);
    }
}
