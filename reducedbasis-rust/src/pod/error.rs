//! Error types for POD compression

use crate::eigen::EigenError;

/// Why a correlation spectrum failed the Hermitian check
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SpectrumDefect {
    #[error("eigenvalue {index} = {real} + {imaginary}i has a non-negligible imaginary part")]
    ComplexEigenvalue {
        index: usize,
        real: f64,
        imaginary: f64,
    },
    /// Only possible when the inner product operator is not symmetric
    #[error("correlation operator is not symmetric (asymmetry {asymmetry:e} > {tolerance:e})")]
    NotSymmetric { asymmetry: f64, tolerance: f64 },
}

/// Error types for POD compression and reporting
#[derive(Debug, thiserror::Error)]
pub enum PodError {
    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Requested {requested} basis functions, but only {available} snapshots are stored")]
    InsufficientSnapshots { requested: usize, available: usize },
    #[error("Non-Hermitian correlation spectrum: {0}")]
    NonHermitianSpectrum(SpectrumDefect),
    #[error("Mode {index} is degenerate: norm {norm:e} for eigenvalue {eigenvalue:e}")]
    DegenerateMode {
        index: usize,
        norm: f64,
        eigenvalue: f64,
    },
    #[error("No eigenvalues available: compression has not been run")]
    NotComputed,
    #[error("Requested {requested} eigenvalues, but only {available} are stored")]
    TooManyEigenvalues { requested: usize, available: usize },
    #[error("Inner product operator must be square, got {rows}x{cols}")]
    NonSquareInnerProduct { rows: usize, cols: usize },
    #[error("Total energy of the reported eigenvalues is zero")]
    ZeroTotalEnergy,
    #[error("Eigen-solve failed: {0}")]
    Eigen(#[from] EigenError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
