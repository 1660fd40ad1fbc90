//! Dense Hermitian eigen-solver
//!
//! Solves `A x = λ x` (or the generalized problem `A x = λ B x` with `B`
//! symmetric positive definite) for small dense operators, such as the
//! snapshot correlation matrix of a POD. Eigenpairs are returned ordered
//! according to the requested [`Spectrum`].

use mdarray::DTensor;
use nalgebra::{Cholesky, DMatrix, SymmetricEigen};
use num_complex::Complex;

use crate::mdarray_compat::{dvector_to_tensor, tensor_to_dmatrix};

/// Kind of eigenvalue problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemType {
    /// `A x = λ x` with `A` symmetric
    #[default]
    Hermitian,
    /// `A x = λ B x` with `A` symmetric and `B` symmetric positive definite
    GeneralizedHermitian,
}

/// Which end of the spectrum comes first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spectrum {
    #[default]
    LargestReal,
    SmallestReal,
    LargestMagnitude,
    SmallestMagnitude,
}

/// Eigen-solver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenSolverParameters {
    pub problem_type: ProblemType,
    pub spectrum: Spectrum,
    /// Relative tolerance on `max|A - Aᵗ| / max|A|`
    pub symmetry_tolerance: f64,
}

impl Default for EigenSolverParameters {
    fn default() -> Self {
        Self {
            problem_type: ProblemType::Hermitian,
            spectrum: Spectrum::LargestReal,
            symmetry_tolerance: 1e-8,
        }
    }
}

impl EigenSolverParameters {
    pub fn new(problem_type: ProblemType, spectrum: Spectrum) -> Self {
        Self {
            problem_type,
            spectrum,
            ..Self::default()
        }
    }

    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }
}

/// Error types for eigen-solver computation
#[derive(Debug, thiserror::Error)]
pub enum EigenError {
    #[error("Operator must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("Operator is not symmetric: relative asymmetry {asymmetry:e} exceeds {tolerance:e}")]
    NotSymmetric { asymmetry: f64, tolerance: f64 },
    #[error("Operator contains a non-finite entry at ({row}, {col})")]
    NonFiniteEntry { row: usize, col: usize },
    #[error("Right-hand side operator is not positive definite")]
    NotPositiveDefinite,
    #[error("Operator shapes differ: left {left:?}, right {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("Problem type {problem_type:?} does not match the supplied operators")]
    ProblemTypeMismatch { problem_type: ProblemType },
    #[error("Eigenpair index {index} out of range ({len} eigenpairs)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Eigenvector {index} has length {actual}, expected {expected}")]
    EigenvectorLength {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Ordered eigenpairs of a dense operator
///
/// Eigenvalues carry a real and an imaginary part; for Hermitian problems the
/// imaginary parts are exactly zero.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    eigenvalues: Vec<Complex<f64>>,
    eigenvectors_re: Vec<DTensor<f64, 1>>,
    eigenvectors_im: Vec<DTensor<f64, 1>>,
}

impl EigenDecomposition {
    /// Assemble a decomposition from already ordered eigenpairs
    ///
    /// All eigenvectors (real and imaginary parts) must share one length.
    pub fn from_parts(
        eigenvalues: Vec<Complex<f64>>,
        eigenvectors_re: Vec<DTensor<f64, 1>>,
        eigenvectors_im: Vec<DTensor<f64, 1>>,
    ) -> Result<Self, EigenError> {
        let len = eigenvalues.len();
        if eigenvectors_re.len() != len {
            return Err(EigenError::IndexOutOfRange {
                index: eigenvectors_re.len(),
                len,
            });
        }
        if eigenvectors_im.len() != len {
            return Err(EigenError::IndexOutOfRange {
                index: eigenvectors_im.len(),
                len,
            });
        }
        let expected = eigenvectors_re.first().map(|v| v.len()).unwrap_or(0);
        for (index, v) in eigenvectors_re.iter().chain(eigenvectors_im.iter()).enumerate() {
            if v.len() != expected {
                return Err(EigenError::EigenvectorLength {
                    index: index % len.max(1),
                    expected,
                    actual: v.len(),
                });
            }
        }
        Ok(Self {
            eigenvalues,
            eigenvectors_re,
            eigenvectors_im,
        })
    }

    /// Number of stored eigenpairs
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Eigenvalue `i` as `(real, imaginary)`
    pub fn get_eigenvalue(&self, i: usize) -> Result<(f64, f64), EigenError> {
        self.eigenvalues
            .get(i)
            .map(|z| (z.re, z.im))
            .ok_or(EigenError::IndexOutOfRange {
                index: i,
                len: self.len(),
            })
    }

    /// Eigenvector `i` as `(real part, imaginary part)`
    pub fn get_eigenvector(
        &self,
        i: usize,
    ) -> Result<(&DTensor<f64, 1>, &DTensor<f64, 1>), EigenError> {
        match (self.eigenvectors_re.get(i), self.eigenvectors_im.get(i)) {
            (Some(re), Some(im)) => Ok((re, im)),
            _ => Err(EigenError::IndexOutOfRange {
                index: i,
                len: self.len(),
            }),
        }
    }

    /// All eigenvalues in stored order
    pub fn eigenvalues(&self) -> &[Complex<f64>] {
        &self.eigenvalues
    }
}

/// Eigen-solver for a dense operator, with an optional right-hand side
/// operator for generalized problems
#[derive(Debug, Clone)]
pub struct EigenSolver<'a> {
    operator: &'a DTensor<f64, 2>,
    rhs: Option<&'a DTensor<f64, 2>>,
    parameters: EigenSolverParameters,
}

impl<'a> EigenSolver<'a> {
    /// Solver for `A x = λ x`
    pub fn new(operator: &'a DTensor<f64, 2>) -> Self {
        Self {
            operator,
            rhs: None,
            parameters: EigenSolverParameters::default(),
        }
    }

    /// Solver for `A x = λ B x`
    pub fn generalized(operator: &'a DTensor<f64, 2>, rhs: &'a DTensor<f64, 2>) -> Self {
        Self {
            operator,
            rhs: Some(rhs),
            parameters: EigenSolverParameters::new(
                ProblemType::GeneralizedHermitian,
                Spectrum::LargestReal,
            ),
        }
    }

    pub fn set_parameters(&mut self, parameters: EigenSolverParameters) {
        self.parameters = parameters;
    }

    pub fn with_parameters(mut self, parameters: EigenSolverParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Solve and return eigenpairs ordered by the configured spectrum
    pub fn solve(&self) -> Result<EigenDecomposition, EigenError> {
        let a = checked_symmetric(self.operator, self.parameters.symmetry_tolerance)?;
        let n = a.nrows();

        let (eigenvalues, eigenvectors) = match (self.parameters.problem_type, self.rhs) {
            (ProblemType::Hermitian, None) => {
                let eig = SymmetricEigen::new(a);
                (eig.eigenvalues, eig.eigenvectors)
            }
            (ProblemType::GeneralizedHermitian, Some(rhs)) => {
                let b = checked_symmetric(rhs, self.parameters.symmetry_tolerance)?;
                if b.shape() != (n, n) {
                    return Err(EigenError::ShapeMismatch {
                        left: (n, n),
                        right: b.shape(),
                    });
                }
                solve_generalized(a, b)?
            }
            (problem_type, _) => {
                return Err(EigenError::ProblemTypeMismatch { problem_type });
            }
        };

        let order = spectrum_order(eigenvalues.as_slice(), self.parameters.spectrum);

        let mut values = Vec::with_capacity(n);
        let mut vectors_re = Vec::with_capacity(n);
        let mut vectors_im = Vec::with_capacity(n);
        for &k in &order {
            let mut v = eigenvectors.column(k).into_owned();
            canonicalize_sign(v.as_mut_slice());
            values.push(Complex::new(eigenvalues[k], 0.0));
            vectors_re.push(dvector_to_tensor(&v));
            vectors_im.push(DTensor::<f64, 1>::zeros([n]));
        }

        EigenDecomposition::from_parts(values, vectors_re, vectors_im)
    }
}

/// Reduce `A x = λ B x` to a standard problem with the Cholesky factor of `B`
///
/// With `B = L Lᵗ`, the eigenpairs of `C = L⁻¹ A L⁻ᵗ` give `x = L⁻ᵗ y`, which
/// are `B`-orthonormal.
fn solve_generalized(
    a: DMatrix<f64>,
    b: DMatrix<f64>,
) -> Result<(nalgebra::DVector<f64>, DMatrix<f64>), EigenError> {
    let l = Cholesky::new(b)
        .ok_or(EigenError::NotPositiveDefinite)?
        .l();
    let y = l
        .solve_lower_triangular(&a)
        .ok_or(EigenError::NotPositiveDefinite)?;
    let c = l
        .solve_lower_triangular(&y.transpose())
        .ok_or(EigenError::NotPositiveDefinite)?;
    let c = (&c + c.transpose()) * 0.5;

    let eig = SymmetricEigen::new(c);
    let x = l
        .transpose()
        .solve_upper_triangular(&eig.eigenvectors)
        .ok_or(EigenError::NotPositiveDefinite)?;
    Ok((eig.eigenvalues, x))
}

/// Convert to nalgebra, checking squareness, finiteness and symmetry
///
/// The returned matrix is the symmetric part `(A + Aᵗ) / 2`.
fn checked_symmetric(
    operator: &DTensor<f64, 2>,
    tolerance: f64,
) -> Result<DMatrix<f64>, EigenError> {
    let (rows, cols) = *operator.shape();
    if rows != cols {
        return Err(EigenError::NotSquare { rows, cols });
    }

    let a = tensor_to_dmatrix(operator);
    let mut max_abs = 0.0_f64;
    let mut max_asym = 0.0_f64;
    for i in 0..rows {
        for j in 0..cols {
            let aij = a[(i, j)];
            if !aij.is_finite() {
                return Err(EigenError::NonFiniteEntry { row: i, col: j });
            }
            max_abs = max_abs.max(aij.abs());
            max_asym = max_asym.max((aij - a[(j, i)]).abs());
        }
    }

    let asymmetry = if max_abs > 0.0 { max_asym / max_abs } else { 0.0 };
    if asymmetry > tolerance {
        return Err(EigenError::NotSymmetric {
            asymmetry,
            tolerance,
        });
    }

    Ok((&a + a.transpose()) * 0.5)
}

/// Indices of `eigenvalues` in spectrum order
///
/// The sort is stable, so equal keys keep ascending original index.
fn spectrum_order(eigenvalues: &[f64], spectrum: Spectrum) -> Vec<usize> {
    let key = |k: usize| match spectrum {
        Spectrum::LargestReal | Spectrum::SmallestReal => eigenvalues[k],
        Spectrum::LargestMagnitude | Spectrum::SmallestMagnitude => eigenvalues[k].abs(),
    };

    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    match spectrum {
        Spectrum::LargestReal | Spectrum::LargestMagnitude => order.sort_by(|&a, &b| {
            key(b)
                .partial_cmp(&key(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        Spectrum::SmallestReal | Spectrum::SmallestMagnitude => order.sort_by(|&a, &b| {
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
    order
}

/// Fix the sign freedom of an eigenvector: the entry of largest magnitude
/// is made positive.
fn canonicalize_sign(v: &mut [f64]) {
    let mut pivot = 0.0_f64;
    for &x in v.iter() {
        if x.abs() > pivot.abs() {
            pivot = x;
        }
    }
    if pivot < 0.0 {
        for x in v.iter_mut() {
            *x = -*x;
        }
    }
}

#[cfg(test)]
#[path = "eigen_tests.rs"]
mod tests;
