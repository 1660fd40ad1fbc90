mod common;

use approx::assert_abs_diff_eq;
use common::{mass_matrix_1d, random_snapshots};
use mdarray::{tensor, DTensor};
use reducedbasis_rust::backend::{AlgebraBackend, Backend};
use reducedbasis_rust::{
    product, sum, AffineExpansionStorage, BasisContainer, ComponentMaps, OnlineMatrix,
    OnlineSize, OnlineVector, PodConfig, ProductError, ProperOrthogonalDecomposition,
};

/// 1D stiffness matrix on a uniform mesh of [0, 1] with `n` nodes
fn stiffness_matrix_1d(n: usize) -> DTensor<f64, 2> {
    let h = 1.0 / (n - 1) as f64;
    DTensor::<f64, 2>::from_fn([n, n], |idx| {
        let (i, j) = (idx[0], idx[1]);
        if i == j {
            if i == 0 || i == n - 1 {
                1.0 / h
            } else {
                2.0 / h
            }
        } else if i.abs_diff(j) == 1 {
            -1.0 / h
        } else {
            0.0
        }
    })
}

/// Zᵗ A Z as a tagged online matrix
fn project(backend: &Backend, z: &DTensor<f64, 2>, a: &DTensor<f64, 2>) -> OnlineMatrix {
    let reduced = backend.multiply(&backend.transpose(z), &backend.multiply(a, z));
    let (n, _) = *reduced.shape();
    OnlineMatrix::with_sizes(reduced, OnlineSize::Single(n), OnlineSize::Single(n)).unwrap()
}

#[test]
fn test_reduced_operator_matches_projection() {
    let n_dofs = 25;
    let x = mass_matrix_1d(n_dofs);
    let mut pod = ProperOrthogonalDecomposition::new(Some(x.clone()), PodConfig::default()).unwrap();
    for s in random_snapshots(11, n_dofs, 6) {
        pod.store_snapshot(s).unwrap();
    }
    let (basis, n) = pod.apply(4).unwrap();
    assert_eq!(basis.len(), 4);

    let backend = Backend::default();
    let z = basis.as_matrix();
    let k = stiffness_matrix_1d(n_dofs);

    // a(u, v; μ) = θ0(μ) k(u, v) + θ1(μ) m(u, v)
    let operators = AffineExpansionStorage::from_operators(vec![
        project(&backend, &z, &k),
        project(&backend, &z, &x),
    ]);
    let thetas = [0.3, 2.5];
    let reduced = sum(product(&thetas, &operators, None).unwrap());
    let reduced = reduced.as_matrix().unwrap();

    let full = DTensor::<f64, 2>::from_fn([n_dofs, n_dofs], |idx| {
        thetas[0] * k[[idx[0], idx[1]]] + thetas[1] * x[[idx[0], idx[1]]]
    });
    let expected = project(&backend, &z, &full);

    for i in 0..n {
        for j in 0..n {
            assert_abs_diff_eq!(reduced.get(i, j), expected.get(i, j), epsilon = 1e-10);
        }
    }
    assert_eq!(reduced.m(), Some(&OnlineSize::Single(n)));

    // Projected mass matrix of an X-orthonormal basis is the identity
    let mass = project(&backend, &z, &x);
    for i in 0..n {
        assert_abs_diff_eq!(mass.get(i, i), 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_riesz_product_is_non_negative() {
    // Gram grid of random vectors is positive semidefinite
    let vectors = random_snapshots(21, 6, 3);
    let grid: Vec<Vec<f64>> = vectors
        .iter()
        .map(|a| {
            vectors
                .iter()
                .map(|b| (0..6).map(|i| a[[i]] * b[[i]]).sum())
                .collect()
        })
        .collect();
    let operators = AffineExpansionStorage::from_grid(grid).unwrap();

    for thetas in [[1.0, -1.0, 0.5], [0.0, 0.0, 1.0], [-3.0, 2.0, 1.0]] {
        let value = sum(product(&thetas, &operators, Some(&thetas[..])).unwrap())
            .as_scalar()
            .unwrap();
        assert!(value >= -1e-12, "quadratic form {} < 0", value);
    }
}

#[test]
fn test_length_mismatch_reports_lengths() {
    let operators = AffineExpansionStorage::from_operators(vec![OnlineVector::new(
        DTensor::<f64, 1>::zeros([3]),
    )]);
    let err = product(&[1.0, 2.0], &operators, None).unwrap_err();
    assert!(matches!(err, ProductError::LengthMismatch { expected: 1, actual: 2, .. }));
    let message = err.to_string();
    assert!(message.contains("expected 1"));
    assert!(message.contains("got 2"));
}

#[test]
fn test_multi_component_metadata_survives() {
    let mut z = reducedbasis_rust::BasisFunctionsMatrix::with_components(2, &["u", "p"]).unwrap();
    z.enrich_component("u", tensor![1.0, 0.0]).unwrap();
    z.enrich_component("p", tensor![0.0, 1.0]).unwrap();

    let size = z.online_size();
    let maps: ComponentMaps = z.component_maps().unwrap();
    let a = OnlineMatrix::with_sizes(z.as_matrix(), size.clone(), size.clone()).unwrap();

    let mut operators = AffineExpansionStorage::from_operators(vec![a.clone(), a]);
    operators.set_component_maps(maps.clone());

    let output = product(&[1.0, -1.0], &operators, None).unwrap();
    let result = output.value().as_matrix().unwrap();
    assert_eq!(result.m(), Some(&size));
    assert_eq!(result.n(), Some(&size));
    assert_eq!(result.component_maps(), Some(&maps));
    assert_eq!(result.get(0, 0), 0.0);
}
