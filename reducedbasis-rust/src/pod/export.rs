//! Eigenvalue and retained-energy exports
//!
//! Files are plain text with one `"<index> <value>"` record per line. Only the
//! I/O process writes; every process then waits on the communicator barrier.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::backend::AlgebraBackend;
use crate::parallel::Communicator;

use super::compute::ProperOrthogonalDecomposition;
use super::error::PodError;

/// Retained energy `Σ_{k≤i} λ_k / Σ_k λ_k`
///
/// Negative eigenvalues are round-off of a positive semidefinite correlation
/// operator and count as zero energy, so the result is non-decreasing and
/// ends at exactly 1.
///
/// # Errors
/// `ZeroTotalEnergy` if the eigenvalues sum to zero (or a non-finite value)
pub fn retained_energy(eigenvalues: &[f64]) -> Result<Vec<f64>, PodError> {
    let energies: Vec<f64> = eigenvalues
        .iter()
        .map(|&lambda| if lambda < 0.0 { 0.0 } else { lambda })
        .collect();
    let total: f64 = energies.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(PodError::ZeroTotalEnergy);
    }
    let mut cumulative = 0.0;
    Ok(energies
        .iter()
        .map(|lambda| {
            cumulative += lambda;
            cumulative / total
        })
        .collect())
}

fn write_records(path: &Path, records: &[(usize, f64)]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (i, value) in records {
        // `{:?}` keeps the decimal point of integral values ("3.0")
        writeln!(writer, "{} {:?}", i, value)?;
    }
    writer.flush()
}

/// Write on the I/O process, then synchronize every process
///
/// The barrier is reached even if the write fails; the write error is
/// returned afterwards.
fn write_shared<C: Communicator>(
    communicator: &C,
    path: &Path,
    records: &[(usize, f64)],
) -> Result<(), PodError> {
    let result = if communicator.is_io_process() {
        info!(path = %path.display(), records = records.len(), "writing POD export");
        write_records(path, records)
    } else {
        Ok(())
    };
    communicator.barrier();
    result.map_err(PodError::from)
}

impl<B, C> ProperOrthogonalDecomposition<B, C>
where
    B: AlgebraBackend,
    C: Communicator,
{
    /// Export every stored eigenvalue as `"<i> <λ_i>"` lines
    pub fn save_eigenvalues_file(&self, path: impl AsRef<Path>) -> Result<(), PodError> {
        let records = self
            .eigenvalues(None)?
            .collect::<Result<Vec<(usize, f64)>, PodError>>()?;
        write_shared(self.communicator(), path.as_ref(), &records)
    }

    /// Export the retained energy of every stored eigenvalue as `"<i> <E_i>"` lines
    pub fn save_retained_energy_file(&self, path: impl AsRef<Path>) -> Result<(), PodError> {
        let eigenvalues = self
            .eigenvalues(None)?
            .map(|item| item.map(|(_, lambda)| lambda))
            .collect::<Result<Vec<f64>, PodError>>()?;
        let records: Vec<(usize, f64)> = retained_energy(&eigenvalues)?
            .into_iter()
            .enumerate()
            .collect();
        write_shared(self.communicator(), path.as_ref(), &records)
    }
}
