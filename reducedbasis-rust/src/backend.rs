//! Dense algebra backends
//!
//! The POD compressor only needs a small capability set from its algebra
//! backend: transpose, matrix multiplication, rescaling and a Hermitian
//! eigen-solve. This module defines that capability set as a trait and
//! provides two implementations.
//!
//! # Design
//! - **Default**: Pure Rust Faer GEMM through `mdarray-linalg-faer`
//! - **Alternative**: nalgebra GEMM
//! - **Selection**: fixed at construction via [`BackendKind`], no global state
//!
//! # Example
//! ```ignore
//! use reducedbasis_rust::backend::{AlgebraBackend, Backend, BackendKind};
//!
//! let backend = Backend::from(BackendKind::Nalgebra);
//! let c = backend.multiply(&a, &b);
//! ```

use mdarray::DTensor;

use crate::eigen::{EigenDecomposition, EigenError, EigenSolver, EigenSolverParameters};
use crate::mdarray_compat::{column, column_matrix, dmatrix_to_tensor, dot, tensor_to_dmatrix};

//==============================================================================
// AlgebraBackend Trait
//==============================================================================

/// Algebra capability set consumed by the reduction core
pub trait AlgebraBackend {
    /// Returns backend name for debugging
    fn name(&self) -> &'static str;

    /// Matrix multiplication: C = A * B
    ///
    /// # Panics
    /// Panics if matrix dimensions are incompatible (A.cols != B.rows)
    fn multiply(&self, a: &DTensor<f64, 2>, b: &DTensor<f64, 2>) -> DTensor<f64, 2>;

    /// Transpose: Aᵗ
    fn transpose(&self, a: &DTensor<f64, 2>) -> DTensor<f64, 2> {
        let (m, n) = *a.shape();
        DTensor::<f64, 2>::from_fn([n, m], |idx| a[[idx[1], idx[0]]])
    }

    /// Matrix-vector multiplication: y = A * x
    fn multiply_vector(&self, a: &DTensor<f64, 2>, x: &DTensor<f64, 1>) -> DTensor<f64, 1> {
        column(&self.multiply(a, &column_matrix(x)), 0)
    }

    /// Rescale a vector by the reciprocal of `norm`: v / norm
    fn rescale(&self, v: &DTensor<f64, 1>, norm: f64) -> DTensor<f64, 1> {
        DTensor::<f64, 1>::from_fn([v.len()], |idx| v[[idx[0]]] / norm)
    }

    /// Solve the eigenproblem of a square operator
    fn eigen_solve(
        &self,
        operator: &DTensor<f64, 2>,
        parameters: &EigenSolverParameters,
    ) -> Result<EigenDecomposition, EigenError> {
        EigenSolver::new(operator)
            .with_parameters(*parameters)
            .solve()
    }
}

/// Inner product `aᵗ X b`, or `aᵗ b` when no inner-product operator is given
pub fn inner_product<B: AlgebraBackend + ?Sized>(
    backend: &B,
    a: &DTensor<f64, 1>,
    x: Option<&DTensor<f64, 2>>,
    b: &DTensor<f64, 1>,
) -> f64 {
    match x {
        Some(x) => dot(a, &backend.multiply_vector(x, b)),
        None => dot(a, b),
    }
}

fn check_matmul_shapes(a: &DTensor<f64, 2>, b: &DTensor<f64, 2>) -> (usize, usize, usize) {
    let (m, k) = *a.shape();
    let (k2, n) = *b.shape();
    assert_eq!(
        k, k2,
        "Matrix dimension mismatch: A.cols ({}) != B.rows ({})",
        k, k2
    );
    (m, k, n)
}

//==============================================================================
// Faer Backend (Default, Pure Rust)
//==============================================================================

/// Faer GEMM backend
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerBackend;

impl AlgebraBackend for FaerBackend {
    fn name(&self) -> &'static str {
        "Faer (Pure Rust)"
    }

    fn multiply(&self, a: &DTensor<f64, 2>, b: &DTensor<f64, 2>) -> DTensor<f64, 2> {
        use mdarray_linalg::matmul::{MatMul, MatMulBuilder};
        use mdarray_linalg_faer::Faer;

        let (m, k, n) = check_matmul_shapes(a, b);
        if m == 0 || k == 0 || n == 0 {
            return DTensor::<f64, 2>::zeros([m, n]);
        }
        Faer.matmul(a, b).eval()
    }
}

//==============================================================================
// nalgebra Backend
//==============================================================================

/// nalgebra GEMM backend
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraBackend;

impl AlgebraBackend for NalgebraBackend {
    fn name(&self) -> &'static str {
        "nalgebra"
    }

    fn multiply(&self, a: &DTensor<f64, 2>, b: &DTensor<f64, 2>) -> DTensor<f64, 2> {
        check_matmul_shapes(a, b);
        let c = tensor_to_dmatrix(a) * tensor_to_dmatrix(b);
        dmatrix_to_tensor(&c)
    }
}

//==============================================================================
// Construction-time selection
//==============================================================================

/// Backend choice carried by configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Faer,
    Nalgebra,
}

/// Closed set of built-in backends
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Faer(FaerBackend),
    Nalgebra(NalgebraBackend),
}

impl From<BackendKind> for Backend {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Faer => Backend::Faer(FaerBackend),
            BackendKind::Nalgebra => Backend::Nalgebra(NalgebraBackend),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::from(BackendKind::default())
    }
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Faer(_) => BackendKind::Faer,
            Backend::Nalgebra(_) => BackendKind::Nalgebra,
        }
    }
}

impl AlgebraBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Faer(b) => b.name(),
            Backend::Nalgebra(b) => b.name(),
        }
    }

    fn multiply(&self, a: &DTensor<f64, 2>, b: &DTensor<f64, 2>) -> DTensor<f64, 2> {
        match self {
            Backend::Faer(backend) => backend.multiply(a, b),
            Backend::Nalgebra(backend) => backend.multiply(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdarray_compat::vector_from_slice;
    use mdarray::tensor;

    fn backends() -> Vec<Backend> {
        vec![
            Backend::from(BackendKind::Faer),
            Backend::from(BackendKind::Nalgebra),
        ]
    }

    #[test]
    fn test_default_backend_is_faer() {
        let backend = Backend::default();
        assert_eq!(backend.kind(), BackendKind::Faer);
        assert_eq!(backend.name(), "Faer (Pure Rust)");
    }

    #[test]
    fn test_multiply_basic() {
        let a: DTensor<f64, 2> = tensor![[1.0, 2.0], [3.0, 4.0]];
        let b: DTensor<f64, 2> = tensor![[5.0, 6.0], [7.0, 8.0]];

        for backend in backends() {
            let c = backend.multiply(&a, &b);
            // Expected: [[19, 22], [43, 50]]
            assert!((c[[0, 0]] - 19.0).abs() < 1e-10, "{}", backend.name());
            assert!((c[[0, 1]] - 22.0).abs() < 1e-10, "{}", backend.name());
            assert!((c[[1, 0]] - 43.0).abs() < 1e-10, "{}", backend.name());
            assert!((c[[1, 1]] - 50.0).abs() < 1e-10, "{}", backend.name());
        }
    }

    #[test]
    fn test_multiply_non_square() {
        let a: DTensor<f64, 2> = tensor![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]; // 2x3
        let b: DTensor<f64, 2> = tensor![[7.0], [8.0], [9.0]]; // 3x1

        for backend in backends() {
            let c = backend.multiply(&a, &b);
            assert_eq!(*c.shape(), (2, 1));
            assert!((c[[0, 0]] - 50.0).abs() < 1e-10);
            assert!((c[[1, 0]] - 122.0).abs() < 1e-10);
        }
    }

    #[test]
    #[should_panic(expected = "Matrix dimension mismatch")]
    fn test_multiply_dimension_mismatch() {
        let a: DTensor<f64, 2> = tensor![[1.0, 2.0]];
        let b: DTensor<f64, 2> = tensor![[1.0, 2.0]];
        NalgebraBackend.multiply(&a, &b);
    }

    #[test]
    fn test_transpose_and_rescale() {
        let backend = Backend::default();
        let a: DTensor<f64, 2> = tensor![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let at = backend.transpose(&a);
        assert_eq!(*at.shape(), (3, 2));
        assert_eq!(at[[2, 0]], 3.0);
        assert_eq!(at[[0, 1]], 4.0);

        let v = vector_from_slice(&[3.0, 4.0]);
        let w = backend.rescale(&v, 5.0);
        assert!((w[[0]] - 0.6).abs() < 1e-15);
        assert!((w[[1]] - 0.8).abs() < 1e-15);
    }

    #[test]
    fn test_inner_product_with_and_without_operator() {
        let backend = NalgebraBackend;
        let a = vector_from_slice(&[1.0, 2.0]);
        let b = vector_from_slice(&[3.0, -1.0]);
        assert_eq!(inner_product(&backend, &a, None, &b), 1.0);

        let x: DTensor<f64, 2> = tensor![[2.0, 0.0], [0.0, 3.0]];
        // aᵗ X b = 1*2*3 + 2*3*(-1) = 0
        assert_eq!(inner_product(&backend, &a, Some(&x), &b), 0.0);
    }

    #[test]
    fn test_eigen_solve_default_method() {
        let a: DTensor<f64, 2> = tensor![[3.0, 0.0], [0.0, 1.0]];
        let eig = Backend::default()
            .eigen_solve(&a, &EigenSolverParameters::default())
            .unwrap();
        assert_eq!(eig.get_eigenvalue(0).unwrap(), (3.0, 0.0));
    }
}
