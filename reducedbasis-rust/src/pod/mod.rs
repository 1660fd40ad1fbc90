//! Proper Orthogonal Decomposition (POD) module
//!
//! Compresses a set of full-order snapshots into an orthonormal reduced basis.
//!
//! # Algorithm
//!
//! 1. Correlation operator `C = Sᵗ X S` (`Sᵗ S` without inner product)
//! 2. Hermitian eigen-solve of `C`, eigenvalues in descending order
//! 3. Basis vectors `z_i = S v_i / ‖S v_i‖_X` for the leading modes
//!
//! Eigenvalues and the retained energy `Σ_{k≤i} λ_k / Σ_k λ_k` are kept for
//! reporting and export.

mod compute;
mod config;
mod error;
mod export;

// Re-export public API
pub use compute::{Eigenvalues, ProperOrthogonalDecomposition};
pub use config::PodConfig;
pub use error::{PodError, SpectrumDefect};
pub use export::retained_energy;
