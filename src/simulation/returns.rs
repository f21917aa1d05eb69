//! Conversion of simulated price paths into per-period returns.

use crate::core::types::AssetMatrix;
use crate::core::{Result, WealthError};

/// Period-over-period percentage change of every row of a price matrix.
///
/// The first column is zero. A change off a zero price is also reported
/// as zero.
pub fn to_returns(prices: &[Vec<f64>]) -> Result<AssetMatrix> {
    if prices.is_empty() {
        return Err(WealthError::empty_data("price matrix"));
    }
    prices
        .iter()
        .map(|row| {
            if row.is_empty() {
                return Err(WealthError::empty_data("price path"));
            }
            Ok(row_returns(row))
        })
        .collect()
}

fn row_returns(row: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(row.len());
    out.push(0.0);
    out.extend(row.windows(2).map(|w| {
        if w[0] == 0.0 {
            0.0
        } else {
            w[1] / w[0] - 1.0
        }
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_shape_and_values() {
        let prices = vec![vec![100.0, 110.0, 99.0], vec![10.0, 10.0, 12.0]];
        let returns = to_returns(&prices).unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].len(), 3);
        assert_eq!(returns[0][0], 0.0);
        assert_eq!(returns[1][0], 0.0);
        assert_eq!(returns[0][1], 110.0 / 100.0 - 1.0);
        assert_eq!(returns[0][2], 99.0 / 110.0 - 1.0);
        assert_eq!(returns[1][1], 0.0);
        assert!((returns[1][2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_step() {
        let returns = to_returns(&[vec![42.0]]).unwrap();
        assert_eq!(returns, vec![vec![0.0]]);
    }

    #[test]
    fn test_zero_price() {
        let returns = to_returns(&[vec![0.0, 5.0]]).unwrap();
        assert_eq!(returns[0][1], 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(to_returns(&[]), Err(WealthError::EmptyData { .. })));
        assert!(matches!(to_returns(&[Vec::<f64>::new()]), Err(WealthError::EmptyData { .. })));
    }
}
