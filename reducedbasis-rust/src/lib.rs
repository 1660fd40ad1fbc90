//! # reducedbasis-rust: reduced basis compression and affine products
//!
//! Core numerical pieces of a Reduced Basis Method (RBM) for parametrized PDEs:
//!
//! - **POD compression** ([`pod`]): turns full-order snapshots into an
//!   orthonormal reduced basis ranked by eigenvalue, with eigenvalue and
//!   retained-energy diagnostics
//! - **Affine products** ([`product`]): evaluates theta-weighted sums and
//!   bilinear forms of precomputed online operators, keeping their size tags
//!   and component maps
//!
//! Full-order discretization, greedy sampling and the offline/online drivers
//! live outside this crate; they feed snapshots, inner-product matrices and
//! theta values in and consume the bases and reduced operators.

pub mod affine_expansion;
pub mod backend; // Algebra backends (Faer default, nalgebra)
pub mod basis_functions;
pub mod eigen; // Dense Hermitian eigen-solver
pub mod mdarray_compat;
pub mod online;
pub mod parallel; // Single-writer I/O process and barrier
pub mod pod;
pub mod product;
pub mod snapshots;

// Re-export commonly used types and traits
pub use affine_expansion::{AffineExpansionStorage, ExpansionError};
pub use backend::{AlgebraBackend, Backend, BackendKind, FaerBackend, NalgebraBackend};
pub use basis_functions::{BasisContainer, BasisError, BasisFunctionsMatrix};
pub use eigen::{
    EigenDecomposition, EigenError, EigenSolver, EigenSolverParameters, ProblemType, Spectrum,
};
pub use online::{
    ComponentMaps, OnlineFunction, OnlineMatrix, OnlineOperator, OnlineSize, OnlineVector,
    OperatorError, OperatorKind,
};
pub use parallel::{Communicator, LocalCommunicator, SerialCommunicator};
pub use pod::{PodConfig, PodError, ProperOrthogonalDecomposition, SpectrumDefect};
pub use product::{product, sum, ProductError, ProductOutput};
pub use snapshots::SnapshotsMatrix;

// Re-export external dependencies for convenience
pub use mdarray::DTensor;
