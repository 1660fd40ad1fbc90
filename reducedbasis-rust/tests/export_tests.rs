mod common;

use std::fs;
use std::thread;

use common::random_snapshots;
use mdarray::tensor;
use reducedbasis_rust::backend::Backend;
use reducedbasis_rust::{
    Communicator, LocalCommunicator, PodConfig, PodError, ProperOrthogonalDecomposition,
};

/// Orthogonal snapshots: the correlation matrix is exactly diag(3, 1)
fn compressed() -> ProperOrthogonalDecomposition {
    let mut pod = ProperOrthogonalDecomposition::new(None, PodConfig::default()).unwrap();
    pod.store_snapshot(tensor![1.0, 1.0, 1.0, 0.0]).unwrap();
    pod.store_snapshot(tensor![0.0, 0.0, 0.0, 1.0]).unwrap();
    pod.apply(2).unwrap();
    pod
}

fn parse(contents: &str) -> Vec<(usize, f64)> {
    contents
        .lines()
        .map(|line| {
            let mut fields = line.split_whitespace();
            let i = fields.next().unwrap().parse().unwrap();
            let v = fields.next().unwrap().parse().unwrap();
            assert!(fields.next().is_none());
            (i, v)
        })
        .collect()
}

#[test]
fn test_eigenvalues_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eigs.txt");
    let pod = compressed();
    pod.save_eigenvalues_file(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let records = parse(&contents);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].0, 0);
    assert_eq!(records[1].0, 1);
    assert!((records[0].1 - 3.0).abs() < 1e-12);
    assert!((records[1].1 - 1.0).abs() < 1e-12);
}

#[test]
fn test_eigenvalues_file_format() {
    let dir = tempfile::tempdir().unwrap();
    let pod = compressed();

    let path = dir.path().join("eigs.txt");
    pod.save_eigenvalues_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "0 3.0\n1 1.0\n");

    let energy = dir.path().join("energy.txt");
    pod.save_retained_energy_file(&energy).unwrap();
    assert_eq!(fs::read_to_string(&energy).unwrap(), "0 0.75\n1 1.0\n");
}

#[test]
fn test_retained_energy_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retained_energy.txt");
    let pod = compressed();
    pod.save_retained_energy_file(&path).unwrap();

    let records = parse(&fs::read_to_string(&path).unwrap());
    assert_eq!(records.len(), 2);
    assert!((records[0].1 - 0.75).abs() < 1e-12);
    assert!((records[1].1 - 1.0).abs() < 1e-12);
}

#[test]
fn test_export_before_compression() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eigs.txt");
    let pod = ProperOrthogonalDecomposition::new(None, PodConfig::default()).unwrap();
    assert!(matches!(
        pod.save_eigenvalues_file(&path),
        Err(PodError::NotComputed)
    ));
    assert!(!path.exists());
}

#[test]
fn test_export_io_error_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("eigs.txt");
    let pod = compressed();
    assert!(matches!(pod.save_eigenvalues_file(&path), Err(PodError::Io(_))));
}

#[test]
fn test_single_writer_with_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eigs.txt");
    let snapshots = random_snapshots(17, 8, 3);

    let handles: Vec<_> = LocalCommunicator::group(4)
        .into_iter()
        .map(|comm| {
            let path = path.clone();
            let snapshots = snapshots.clone();
            thread::spawn(move || {
                let rank = comm.rank();
                let mut pod = ProperOrthogonalDecomposition::with_backend(
                    Backend::default(),
                    comm,
                    None,
                    PodConfig::default(),
                )
                .unwrap();
                for s in snapshots {
                    pod.store_snapshot(s).unwrap();
                }
                pod.apply(2).unwrap();
                pod.save_eigenvalues_file(&path).unwrap();
                // Past the barrier, the file is complete on every rank
                (rank, fs::read_to_string(&path).unwrap())
            })
        })
        .collect();

    let results: Vec<(usize, String)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &results[0].1;
    assert_eq!(first.lines().count(), 3);
    for (_, contents) in &results {
        assert_eq!(contents, first);
    }
}
