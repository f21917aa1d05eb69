//! numpy array conversions.

use numpy::{PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::prelude::*;

/// Copy a numpy array into a Vec<f64>, contiguous or not.
pub fn numpy_to_vec_f64(arr: &PyReadonlyArray1<f64>) -> Vec<f64> {
    arr.as_array().to_vec()
}

/// Convert Vec<i64> from numpy.
pub fn numpy_to_vec_i64(arr: &PyReadonlyArray1<i64>) -> Vec<i64> {
    arr.as_array().to_vec()
}

/// Convert Vec<f64> to numpy array.
pub fn vec_to_numpy_f64<'py>(py: Python<'py>, vec: Vec<f64>) -> &'py PyArray1<f64> {
    PyArray1::from_vec(py, vec)
}

/// Convert a rectangular matrix to a 2-D numpy array.
pub fn matrix_to_numpy_f64<'py>(py: Python<'py>, rows: &[Vec<f64>]) -> PyResult<&'py PyArray2<f64>> {
    PyArray2::from_vec2(py, rows)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}
