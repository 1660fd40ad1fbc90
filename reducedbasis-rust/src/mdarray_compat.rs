//! Compatibility layer between mdarray and nalgebra
//!
//! The public API works with `mdarray` tensors, while the eigen-solver and the
//! nalgebra backend operate on `DMatrix`/`DVector`. These helpers copy between
//! the two representations.

use mdarray::DTensor;
use nalgebra::{DMatrix, DVector};

/// Convert mdarray matrix to nalgebra DMatrix
pub fn tensor_to_dmatrix(tensor: &DTensor<f64, 2>) -> DMatrix<f64> {
    let (m, n) = *tensor.shape();
    DMatrix::from_fn(m, n, |i, j| tensor[[i, j]])
}

/// Convert nalgebra DMatrix to mdarray matrix
pub fn dmatrix_to_tensor(matrix: &DMatrix<f64>) -> DTensor<f64, 2> {
    DTensor::<f64, 2>::from_fn([matrix.nrows(), matrix.ncols()], |idx| {
        matrix[(idx[0], idx[1])]
    })
}

/// Convert mdarray vector to nalgebra DVector
pub fn tensor_to_dvector(tensor: &DTensor<f64, 1>) -> DVector<f64> {
    DVector::from_fn(tensor.len(), |i, _| tensor[[i]])
}

/// Convert nalgebra DVector to mdarray vector
pub fn dvector_to_tensor(vector: &DVector<f64>) -> DTensor<f64, 1> {
    DTensor::<f64, 1>::from_fn([vector.len()], |idx| vector[idx[0]])
}

/// Build an mdarray vector from a slice
pub fn vector_from_slice(values: &[f64]) -> DTensor<f64, 1> {
    DTensor::<f64, 1>::from_fn([values.len()], |idx| values[idx[0]])
}

/// Copy an mdarray vector into a `Vec`
pub fn vector_to_vec(tensor: &DTensor<f64, 1>) -> Vec<f64> {
    (0..tensor.len()).map(|i| tensor[[i]]).collect()
}

/// View a vector as an (n × 1) column matrix
pub fn column_matrix(vector: &DTensor<f64, 1>) -> DTensor<f64, 2> {
    DTensor::<f64, 2>::from_fn([vector.len(), 1], |idx| vector[[idx[0]]])
}

/// Extract column `j` of a matrix
pub fn column(matrix: &DTensor<f64, 2>, j: usize) -> DTensor<f64, 1> {
    let (m, n) = *matrix.shape();
    assert!(j < n, "column index {} out of range for {} columns", j, n);
    DTensor::<f64, 1>::from_fn([m], |idx| matrix[[idx[0], j]])
}

/// Euclidean dot product of two vectors
///
/// # Panics
/// Panics if the lengths differ
pub fn dot(a: &DTensor<f64, 1>, b: &DTensor<f64, 1>) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vector length mismatch: {} != {}",
        a.len(),
        b.len()
    );
    (0..a.len()).map(|i| a[[i]] * b[[i]]).sum()
}
