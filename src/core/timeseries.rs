//! Time-indexed price table, one column per symbol.

use super::error::{Result, WealthError};
use super::types::{Price, Timestamp};

/// Historical daily prices for a set of symbols.
///
/// Rows are in ascending time order and every column has one value per row.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    /// Timestamps for each row.
    pub timestamps: Vec<Timestamp>,
    /// Column names.
    pub symbols: Vec<String>,
    /// Price columns, index-aligned with `symbols`.
    pub columns: Vec<Vec<Price>>,
}

impl PriceHistory {
    /// Create a new price history, checking that the table is rectangular.
    pub fn new(
        timestamps: Vec<Timestamp>,
        symbols: Vec<String>,
        columns: Vec<Vec<Price>>,
    ) -> Result<Self> {
        if symbols.len() != columns.len() {
            return Err(WealthError::length_mismatch(symbols.len(), columns.len()));
        }
        for column in &columns {
            if column.len() != timestamps.len() {
                return Err(WealthError::length_mismatch(timestamps.len(), column.len()));
            }
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(WealthError::invalid_parameter(format!(
                    "duplicate symbol {symbol}"
                )));
            }
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(WealthError::invalid_parameter(
                "timestamps must be strictly ascending",
            ));
        }
        Ok(Self {
            timestamps,
            symbols,
            columns,
        })
    }

    /// Create from columns only (row index used as timestamp).
    pub fn from_columns(symbols: Vec<String>, columns: Vec<Vec<Price>>) -> Result<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        Self::new((0..rows as i64).collect(), symbols, columns)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of symbols.
    #[inline]
    pub fn num_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Column index of a symbol.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Price column for a symbol.
    pub fn column(&self, symbol: &str) -> Option<&[Price]> {
        self.position(symbol).map(|i| self.columns[i].as_slice())
    }

    /// Restrict the table to `symbols`, in that order.
    pub fn select(&self, symbols: &[String]) -> Result<Self> {
        let columns = symbols
            .iter()
            .map(|symbol| {
                self.column(symbol).map(<[Price]>::to_vec).ok_or_else(|| {
                    WealthError::invalid_parameter(format!("unknown symbol {symbol}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            timestamps: self.timestamps.clone(),
            symbols: symbols.to_vec(),
            columns,
        })
    }
}

/// Percentage change from the previous value.
///
/// Interior NaNs are forward-filled first, so a gap reads as an unchanged
/// price. The first entry, leading NaNs, and `0 -> 0` changes are `None`. A
/// change off a zero price is infinite.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    let mut last = f64::NAN;
    for (i, &value) in values.iter().enumerate() {
        let prev = last;
        if !value.is_nan() {
            last = value;
        }
        if i == 0 {
            continue;
        }
        let change = last / prev - 1.0;
        if !change.is_nan() {
            result[i] = Some(change);
        }
    }
    result
}

/// Median of a slice. NaN for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
