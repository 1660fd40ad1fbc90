//! Snapshot storage for the POD compressor

use mdarray::DTensor;

use crate::backend::AlgebraBackend;
use crate::pod::PodError;

/// Ordered collection of full-order snapshot vectors of one common dimension
#[derive(Debug, Clone, Default)]
pub struct SnapshotsMatrix {
    snapshots: Vec<DTensor<f64, 1>>,
}

impl SnapshotsMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one snapshot
    ///
    /// # Errors
    /// `PodError::DimensionMismatch` if its length differs from the stored snapshots
    pub fn enrich(&mut self, snapshot: DTensor<f64, 1>) -> Result<(), PodError> {
        if let Some(dim) = self.dim() {
            if snapshot.len() != dim {
                return Err(PodError::DimensionMismatch {
                    context: "snapshot",
                    expected: dim,
                    actual: snapshot.len(),
                });
            }
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot dimension, `None` while empty
    pub fn dim(&self) -> Option<usize> {
        self.snapshots.first().map(|s| s.len())
    }

    pub fn get(&self, i: usize) -> Option<&DTensor<f64, 1>> {
        self.snapshots.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DTensor<f64, 1>> {
        self.snapshots.iter()
    }

    /// Snapshots as columns of a (dim × len) matrix
    pub fn as_matrix(&self) -> DTensor<f64, 2> {
        let dim = self.dim().unwrap_or(0);
        DTensor::<f64, 2>::from_fn([dim, self.len()], |idx| self.snapshots[idx[1]][[idx[0]]])
    }

    /// Linear combination of snapshots: S · coefficients
    ///
    /// # Panics
    /// Panics if `coefficients.len() != self.len()`
    pub fn mul_vector<B: AlgebraBackend + ?Sized>(
        &self,
        backend: &B,
        coefficients: &DTensor<f64, 1>,
    ) -> DTensor<f64, 1> {
        assert_eq!(
            coefficients.len(),
            self.len(),
            "Coefficient length {} does not match snapshot count {}",
            coefficients.len(),
            self.len()
        );
        backend.multiply_vector(&self.as_matrix(), coefficients)
    }
}
