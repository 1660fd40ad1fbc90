//! POD compression

use mdarray::DTensor;
use tracing::{debug, info, warn};

use crate::backend::{inner_product, AlgebraBackend, Backend};
use crate::basis_functions::{BasisContainer, BasisFunctionsMatrix};
use crate::eigen::{EigenDecomposition, EigenError, EigenSolverParameters, ProblemType, Spectrum};
use crate::parallel::{Communicator, SerialCommunicator};
use crate::snapshots::SnapshotsMatrix;

use super::config::PodConfig;
use super::error::{PodError, SpectrumDefect};

/// Proper Orthogonal Decomposition of a snapshot set
///
/// # Type Parameters
/// * `B` - Algebra backend (transpose, multiply, rescale, eigen-solve)
/// * `C` - Communicator used by the single-writer exports
///
/// # Example
/// ```ignore
/// use reducedbasis_rust::pod::{PodConfig, ProperOrthogonalDecomposition};
///
/// let mut pod = ProperOrthogonalDecomposition::new(None, PodConfig::default())?;
/// for snapshot in snapshots {
///     pod.store_snapshot(snapshot)?;
/// }
/// let (basis, n) = pod.apply(2)?;
/// ```
#[derive(Debug, Clone)]
pub struct ProperOrthogonalDecomposition<B = Backend, C = SerialCommunicator>
where
    B: AlgebraBackend,
    C: Communicator,
{
    inner_product: Option<DTensor<f64, 2>>,
    snapshots: SnapshotsMatrix,
    eigen: Option<EigenDecomposition>,
    backend: B,
    communicator: C,
    config: PodConfig,
}

impl ProperOrthogonalDecomposition<Backend, SerialCommunicator> {
    /// Single-process compressor using the backend selected by `config`
    ///
    /// # Arguments
    /// * `inner_product` - Inner-product matrix X, `None` for Euclidean
    /// * `config` - Backend choice and tolerances
    pub fn new(
        inner_product: Option<DTensor<f64, 2>>,
        config: PodConfig,
    ) -> Result<Self, PodError> {
        Self::with_backend(
            Backend::from(config.backend),
            SerialCommunicator,
            inner_product,
            config,
        )
    }
}

impl<B, C> ProperOrthogonalDecomposition<B, C>
where
    B: AlgebraBackend,
    C: Communicator,
{
    /// Compressor with an explicit backend and communicator
    ///
    /// `config.backend` is ignored in favour of `backend`.
    pub fn with_backend(
        backend: B,
        communicator: C,
        inner_product: Option<DTensor<f64, 2>>,
        config: PodConfig,
    ) -> Result<Self, PodError> {
        if let Some(x) = &inner_product {
            let (rows, cols) = *x.shape();
            if rows != cols {
                return Err(PodError::NonSquareInnerProduct { rows, cols });
            }
        }
        Ok(Self {
            inner_product,
            snapshots: SnapshotsMatrix::new(),
            eigen: None,
            backend,
            communicator,
            config,
        })
    }

    /// Remove all snapshots and the last eigen-decomposition
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.eigen = None;
    }

    /// Append one full-order snapshot
    ///
    /// # Errors
    /// `DimensionMismatch` if the snapshot length differs from the stored
    /// snapshots or from the inner-product operator
    pub fn store_snapshot(&mut self, snapshot: DTensor<f64, 1>) -> Result<(), PodError> {
        if let Some(x) = &self.inner_product {
            let (n, _) = *x.shape();
            if snapshot.len() != n {
                return Err(PodError::DimensionMismatch {
                    context: "snapshot against inner product",
                    expected: n,
                    actual: snapshot.len(),
                });
            }
        }
        self.snapshots.enrich(snapshot)
    }

    pub fn snapshots(&self) -> &SnapshotsMatrix {
        &self.snapshots
    }

    pub fn inner_product(&self) -> Option<&DTensor<f64, 2>> {
        self.inner_product.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn communicator(&self) -> &C {
        &self.communicator
    }

    pub fn config(&self) -> &PodConfig {
        &self.config
    }

    /// Eigen-decomposition of the last successful compression
    pub fn eigen_decomposition(&self) -> Option<&EigenDecomposition> {
        self.eigen.as_ref()
    }

    /// Compress the stored snapshots into `nmax` basis functions
    ///
    /// Returns the basis and the achieved rank.
    pub fn apply(&mut self, nmax: usize) -> Result<(BasisFunctionsMatrix, usize), PodError> {
        let dim = self
            .snapshots
            .dim()
            .or_else(|| self.inner_product.as_ref().map(|x| x.shape().0))
            .unwrap_or(0);
        self.apply_into(nmax, BasisFunctionsMatrix::new(dim))
    }

    /// Compress the stored snapshots, appending `nmax` basis functions to `basis`
    ///
    /// Nothing is appended unless every requested mode is valid.
    ///
    /// # Errors
    /// * `InsufficientSnapshots` - `nmax` exceeds the number of snapshots
    /// * `DimensionMismatch` - `basis` holds vectors of another length
    /// * `Eigen` - the correlation operator could not be decomposed
    /// * `NonHermitianSpectrum` - the correlation operator is not symmetric, or
    ///   a retained eigenvalue has an imaginary part
    /// * `DegenerateMode` - a retained mode has (numerically) zero norm
    pub fn apply_into<Z: BasisContainer>(
        &mut self,
        nmax: usize,
        mut basis: Z,
    ) -> Result<(Z, usize), PodError> {
        let n_snapshots = self.snapshots.len();
        if n_snapshots == 0 || nmax > n_snapshots {
            return Err(PodError::InsufficientSnapshots {
                requested: nmax,
                available: n_snapshots,
            });
        }
        let dim = self.snapshots.dim().unwrap_or(0);
        if let Some(expected) = basis.vector_len() {
            if expected != dim {
                return Err(PodError::DimensionMismatch {
                    context: "snapshots against basis container",
                    expected,
                    actual: dim,
                });
            }
        }
        debug!(
            snapshots = n_snapshots,
            nmax,
            backend = self.backend.name(),
            "POD compression"
        );

        let s = self.snapshots.as_matrix();
        let correlation = self.correlation(&s);

        let parameters = EigenSolverParameters::new(ProblemType::Hermitian, Spectrum::LargestReal)
            .with_symmetry_tolerance(self.config.symmetry_tolerance);
        let eigen = self
            .backend
            .eigen_solve(&correlation, &parameters)
            .map_err(|e| match e {
                EigenError::NotSymmetric {
                    asymmetry,
                    tolerance,
                } => PodError::NonHermitianSpectrum(SpectrumDefect::NotSymmetric {
                    asymmetry,
                    tolerance,
                }),
                other => PodError::Eigen(other),
            })?;
        if nmax > eigen.len() {
            return Err(PodError::InsufficientSnapshots {
                requested: nmax,
                available: eigen.len(),
            });
        }

        let (lambda_0, _) = eigen.get_eigenvalue(0)?;
        let reference_norm = lambda_0.max(0.0).sqrt();

        let mut modes = Vec::with_capacity(nmax);
        for i in 0..nmax {
            let (lambda, imaginary) = eigen.get_eigenvalue(i)?;
            if imaginary.abs() > self.config.imaginary_tolerance {
                return Err(PodError::NonHermitianSpectrum(
                    SpectrumDefect::ComplexEigenvalue {
                        index: i,
                        real: lambda,
                        imaginary,
                    },
                ));
            }

            let (v, _) = eigen.get_eigenvector(i)?;
            if v.len() != n_snapshots {
                return Err(PodError::DimensionMismatch {
                    context: "eigenvector against snapshot count",
                    expected: n_snapshots,
                    actual: v.len(),
                });
            }

            let b = self.snapshots.mul_vector(&self.backend, v);
            let norm = inner_product(&self.backend, &b, self.inner_product.as_ref(), &b).sqrt();
            if !norm.is_finite() || norm <= self.config.degenerate_tolerance * reference_norm {
                warn!(index = i, norm, eigenvalue = lambda, "degenerate POD mode");
                return Err(PodError::DegenerateMode {
                    index: i,
                    norm,
                    eigenvalue: lambda,
                });
            }
            modes.push(self.backend.rescale(&b, norm));
        }

        for mode in modes {
            basis.enrich(mode);
        }
        info!(
            rank = nmax,
            leading_eigenvalue = lambda_0,
            eigenpairs = eigen.len(),
            "POD basis computed"
        );
        self.eigen = Some(eigen);
        Ok((basis, nmax))
    }

    /// Sᵗ X S, or Sᵗ S without inner product
    fn correlation(&self, s: &DTensor<f64, 2>) -> DTensor<f64, 2> {
        let st = self.backend.transpose(s);
        match &self.inner_product {
            Some(x) => self.backend.multiply(&st, &self.backend.multiply(x, s)),
            None => self.backend.multiply(&st, s),
        }
    }

    /// Real eigenvalues of the last compression as `(index, λ)`
    ///
    /// # Arguments
    /// * `count` - Number of leading eigenvalues, `None` for all
    ///
    /// Each item re-checks that the imaginary part is negligible. The iterator
    /// is `Clone`, so it can be replayed.
    pub fn eigenvalues(&self, count: Option<usize>) -> Result<Eigenvalues<'_>, PodError> {
        let eigen = self.eigen.as_ref().ok_or(PodError::NotComputed)?;
        let end = count.unwrap_or(eigen.len());
        if end > eigen.len() {
            return Err(PodError::TooManyEigenvalues {
                requested: end,
                available: eigen.len(),
            });
        }
        Ok(Eigenvalues {
            eigen,
            next: 0,
            end,
            imaginary_tolerance: self.config.imaginary_tolerance,
        })
    }

    /// Log the leading eigenvalues
    pub fn print_eigenvalues(&self, count: Option<usize>) -> Result<(), PodError> {
        for item in self.eigenvalues(count)? {
            let (i, lambda) = item?;
            info!("lambda_{} = {:?}", i, lambda);
        }
        Ok(())
    }
}

/// Iterator over `(index, real eigenvalue)` pairs
#[derive(Debug, Clone)]
pub struct Eigenvalues<'a> {
    eigen: &'a EigenDecomposition,
    next: usize,
    end: usize,
    imaginary_tolerance: f64,
}

impl Iterator for Eigenvalues<'_> {
    type Item = Result<(usize, f64), PodError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let item = match self.eigen.get_eigenvalue(i) {
            Ok((real, imaginary)) if imaginary.abs() > self.imaginary_tolerance => {
                Err(PodError::NonHermitianSpectrum(
                    SpectrumDefect::ComplexEigenvalue {
                        index: i,
                        real,
                        imaginary,
                    },
                ))
            }
            Ok((real, _)) => Ok((i, real)),
            Err(e) => Err(e.into()),
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Eigenvalues<'_> {}
