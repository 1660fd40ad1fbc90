//! Common test utilities

#![allow(dead_code)]

use mdarray::DTensor;
use reducedbasis_rust::backend::{inner_product, NalgebraBackend};
use reducedbasis_rust::BasisFunctionsMatrix;

/// Simple deterministic pseudo-random number generator (LCG)
///
/// Linear Congruential Generator for reproducible random numbers in tests.
/// Uses the common parameters: a = 1664525, c = 1013904223 (from Numerical Recipes)
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next f64 in range [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        // Map to [0, 1) using upper 48 bits
        ((self.state >> 16) as f64) / ((1u64 << 48) as f64)
    }

    /// Generate next f64 in range [-1, 1)
    pub fn next_signed(&mut self) -> f64 {
        2.0 * self.next_f64() - 1.0
    }
}

/// `count` random snapshots of length `dim` with entries in [-1, 1)
pub fn random_snapshots(seed: u64, dim: usize, count: usize) -> Vec<DTensor<f64, 1>> {
    let mut rng = SimpleRng::new(seed);
    (0..count)
        .map(|_| DTensor::<f64, 1>::from_fn([dim], |_| rng.next_signed()))
        .collect()
}

/// P1 finite-element mass matrix on a uniform mesh of [0, 1] with `n` nodes
pub fn mass_matrix_1d(n: usize) -> DTensor<f64, 2> {
    assert!(n >= 2, "need at least two nodes");
    let h = 1.0 / (n - 1) as f64;
    DTensor::<f64, 2>::from_fn([n, n], |idx| {
        let (i, j) = (idx[0], idx[1]);
        if i == j {
            if i == 0 || i == n - 1 {
                h / 3.0
            } else {
                2.0 * h / 3.0
            }
        } else if i.abs_diff(j) == 1 {
            h / 6.0
        } else {
            0.0
        }
    })
}

/// Largest deviation of the Gram matrix of `basis` from the identity
pub fn orthonormality_error(basis: &BasisFunctionsMatrix, x: Option<&DTensor<f64, 2>>) -> f64 {
    let vectors: Vec<&DTensor<f64, 1>> = basis.iter().collect();
    let mut max_error: f64 = 0.0;
    for (i, a) in vectors.iter().enumerate() {
        for (j, b) in vectors.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            let g = inner_product(&NalgebraBackend, a, x, b);
            max_error = max_error.max((g - expected).abs());
        }
    }
    max_error
}
