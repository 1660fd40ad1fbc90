//! Construction-time configuration of the POD compressor

use crate::backend::BackendKind;

/// POD configuration
///
/// Passed explicitly at construction; there is no process-wide default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PodConfig {
    /// Algebra backend used for correlation and basis assembly
    pub backend: BackendKind,
    /// Largest accepted |Im λ| of a stored eigenvalue
    pub imaginary_tolerance: f64,
    /// Mode `i` is degenerate when `‖S v_i‖ <= degenerate_tolerance * sqrt(λ_0)`
    pub degenerate_tolerance: f64,
    /// Relative asymmetry accepted for the correlation operator
    pub symmetry_tolerance: f64,
}

impl Default for PodConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            imaginary_tolerance: 1e-8,
            degenerate_tolerance: 1e-7,
            symmetry_tolerance: 1e-8,
        }
    }
}

impl PodConfig {
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_imaginary_tolerance(mut self, tolerance: f64) -> Self {
        self.imaginary_tolerance = tolerance;
        self
    }

    pub fn with_degenerate_tolerance(mut self, tolerance: f64) -> Self {
        self.degenerate_tolerance = tolerance;
        self
    }

    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }
}
