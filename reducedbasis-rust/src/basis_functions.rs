//! Reduced basis containers
//!
//! The compressor appends basis vectors through the [`BasisContainer`] trait.
//! [`BasisFunctionsMatrix`] is the built-in container: an ordered list of
//! full-order vectors, optionally grouped into named components (e.g. velocity
//! and pressure of a mixed problem).

use mdarray::DTensor;

use crate::backend::{inner_product, AlgebraBackend};
use crate::online::{ComponentMaps, OnlineSize};

/// Container the compressor appends basis vectors to
pub trait BasisContainer {
    /// Append one basis vector
    fn enrich(&mut self, vector: DTensor<f64, 1>);

    /// Number of basis vectors
    fn len(&self) -> usize;

    /// Length every appended vector must have, `None` if not yet fixed
    fn vector_len(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BasisContainer for Vec<DTensor<f64, 1>> {
    fn enrich(&mut self, vector: DTensor<f64, 1>) {
        self.push(vector);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn vector_len(&self) -> Option<usize> {
        self.first().map(|v| v.len())
    }
}

/// Error types for basis container operations
#[derive(Debug, thiserror::Error)]
pub enum BasisError {
    #[error("Basis vector has length {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Unknown basis component '{0}'")]
    UnknownComponent(String),
    #[error("Duplicate basis component '{0}'")]
    DuplicateComponent(String),
    #[error("Basis component list must not be empty")]
    NoComponents,
    #[error("Reduced coefficient vector has length {actual}, basis has {expected} functions")]
    CoefficientLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
struct Component {
    name: String,
    vectors: Vec<DTensor<f64, 1>>,
}

/// Ordered reduced basis of full-order vectors
///
/// Vectors are ordered component by component; within a component, in the
/// order they were appended.
#[derive(Debug, Clone)]
pub struct BasisFunctionsMatrix {
    dim: usize,
    components: Vec<Component>,
    named: bool,
}

impl BasisFunctionsMatrix {
    /// Single-component basis of full-order dimension `dim`
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            components: vec![Component {
                name: String::new(),
                vectors: Vec::new(),
            }],
            named: false,
        }
    }

    /// Basis split into named components
    pub fn with_components<S: AsRef<str>>(dim: usize, names: &[S]) -> Result<Self, BasisError> {
        if names.is_empty() {
            return Err(BasisError::NoComponents);
        }
        let mut components: Vec<Component> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if components.iter().any(|c| c.name == name) {
                return Err(BasisError::DuplicateComponent(name.to_string()));
            }
            components.push(Component {
                name: name.to_string(),
                vectors: Vec::new(),
            });
        }
        Ok(Self {
            dim,
            components,
            named: true,
        })
    }

    /// Full-order dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Append a vector to the named component
    pub fn enrich_component(
        &mut self,
        name: &str,
        vector: DTensor<f64, 1>,
    ) -> Result<(), BasisError> {
        self.check_dim(&vector)?;
        let component = self
            .components
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| BasisError::UnknownComponent(name.to_string()))?;
        component.vectors.push(vector);
        Ok(())
    }

    /// Append a vector to the first component, checking its length
    pub fn try_enrich(&mut self, vector: DTensor<f64, 1>) -> Result<(), BasisError> {
        self.check_dim(&vector)?;
        self.components[0].vectors.push(vector);
        Ok(())
    }

    fn check_dim(&self, vector: &DTensor<f64, 1>) -> Result<(), BasisError> {
        if vector.len() != self.dim {
            return Err(BasisError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Number of basis vectors of one component
    pub fn component_len(&self, name: &str) -> Result<usize, BasisError> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.vectors.len())
            .ok_or_else(|| BasisError::UnknownComponent(name.to_string()))
    }

    /// Basis vector `i` in global order
    pub fn get(&self, i: usize) -> Option<&DTensor<f64, 1>> {
        self.iter().nth(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DTensor<f64, 1>> {
        self.components.iter().flat_map(|c| c.vectors.iter())
    }

    /// Remove every basis vector, keeping the component layout
    pub fn clear(&mut self) {
        for c in &mut self.components {
            c.vectors.clear();
        }
    }

    /// Basis vectors as columns of a (dim × N) matrix
    pub fn as_matrix(&self) -> DTensor<f64, 2> {
        let vectors: Vec<&DTensor<f64, 1>> = self.iter().collect();
        DTensor::<f64, 2>::from_fn([self.dim, vectors.len()], |idx| vectors[idx[1]][[idx[0]]])
    }

    /// Reconstruct a full-order vector from reduced coefficients: Z · u_N
    pub fn mul_vector<B: AlgebraBackend + ?Sized>(
        &self,
        backend: &B,
        coefficients: &DTensor<f64, 1>,
    ) -> Result<DTensor<f64, 1>, BasisError> {
        if coefficients.len() != self.len() {
            return Err(BasisError::CoefficientLength {
                expected: self.len(),
                actual: coefficients.len(),
            });
        }
        if self.len() == 0 {
            return Ok(DTensor::<f64, 1>::zeros([self.dim]));
        }
        Ok(backend.multiply_vector(&self.as_matrix(), coefficients))
    }

    /// Z · M for a reduced (N × k) matrix M
    pub fn mul_matrix<B: AlgebraBackend + ?Sized>(
        &self,
        backend: &B,
        reduced: &DTensor<f64, 2>,
    ) -> Result<DTensor<f64, 2>, BasisError> {
        let (rows, _) = *reduced.shape();
        if rows != self.len() {
            return Err(BasisError::CoefficientLength {
                expected: self.len(),
                actual: rows,
            });
        }
        Ok(backend.multiply(&self.as_matrix(), reduced))
    }

    /// Gram matrix G[i, j] = z_iᵗ X z_j (Euclidean without X)
    pub fn gram_matrix<B: AlgebraBackend + ?Sized>(
        &self,
        backend: &B,
        inner: Option<&DTensor<f64, 2>>,
    ) -> DTensor<f64, 2> {
        let vectors: Vec<&DTensor<f64, 1>> = self.iter().collect();
        let n = vectors.len();
        let mut gram = DTensor::<f64, 2>::zeros([n, n]);
        for i in 0..n {
            for j in i..n {
                let g = inner_product(backend, vectors[i], inner, vectors[j]);
                gram[[i, j]] = g;
                gram[[j, i]] = g;
            }
        }
        gram
    }

    /// Reduced size of this basis, split per component when named
    pub fn online_size(&self) -> OnlineSize {
        if self.named {
            OnlineSize::Components(
                self.components
                    .iter()
                    .map(|c| (c.name.clone(), c.vectors.len()))
                    .collect(),
            )
        } else {
            OnlineSize::Single(self.len())
        }
    }

    /// Component-naming maps, `None` for a single unnamed component
    pub fn component_maps(&self) -> Option<ComponentMaps> {
        if !self.named {
            return None;
        }
        let lengths: Vec<(&str, usize)> = self
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.vectors.len()))
            .collect();
        Some(ComponentMaps::from_lengths(&lengths))
    }
}

impl BasisContainer for BasisFunctionsMatrix {
    /// # Panics
    /// Panics if the vector length differs from the basis dimension
    fn enrich(&mut self, vector: DTensor<f64, 1>) {
        let actual = vector.len();
        assert_eq!(
            actual, self.dim,
            "Basis vector has length {}, expected {}",
            actual, self.dim
        );
        self.components[0].vectors.push(vector);
    }

    fn len(&self) -> usize {
        self.components.iter().map(|c| c.vectors.len()).sum()
    }

    fn vector_len(&self) -> Option<usize> {
        Some(self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, NalgebraBackend};
    use crate::mdarray_compat::vector_from_slice;
    use mdarray::tensor;

    #[test]
    fn test_enrich_order_and_matrix() {
        let mut z = BasisFunctionsMatrix::new(2);
        z.enrich(vector_from_slice(&[1.0, 0.0]));
        z.enrich(vector_from_slice(&[0.0, 1.0]));
        assert_eq!(z.len(), 2);
        assert_eq!(z.get(1).unwrap()[[1]], 1.0);
        assert!(z.get(2).is_none());

        let m = z.as_matrix();
        assert_eq!(*m.shape(), (2, 2));
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[0, 1]], 0.0);
        assert_eq!(z.online_size(), OnlineSize::Single(2));
        assert!(z.component_maps().is_none());
    }

    #[test]
    fn test_try_enrich_checks_dimension() {
        let mut z = BasisFunctionsMatrix::new(3);
        assert!(matches!(
            z.try_enrich(vector_from_slice(&[1.0])),
            Err(BasisError::DimensionMismatch { expected: 3, actual: 1 })
        ));
        assert!(z.is_empty());
    }

    #[test]
    fn test_components() {
        let mut z = BasisFunctionsMatrix::with_components(2, &["u", "p"]).unwrap();
        z.enrich_component("p", vector_from_slice(&[0.0, 1.0])).unwrap();
        z.enrich_component("u", vector_from_slice(&[1.0, 0.0])).unwrap();
        z.enrich_component("u", vector_from_slice(&[1.0, 1.0])).unwrap();

        assert_eq!(z.component_len("u").unwrap(), 2);
        assert_eq!(z.component_len("p").unwrap(), 1);
        // Global order is component by component
        assert_eq!(z.get(2).unwrap()[[1]], 1.0);
        assert_eq!(z.get(2).unwrap()[[0]], 0.0);

        let maps = z.component_maps().unwrap();
        assert_eq!(maps.index_to_name[&0], "u");
        assert_eq!(maps.name_to_length["u"], 2);
        assert_eq!(z.online_size().total(), 3);

        assert!(matches!(
            z.enrich_component("T", vector_from_slice(&[0.0, 0.0])),
            Err(BasisError::UnknownComponent(_))
        ));
        assert!(matches!(
            BasisFunctionsMatrix::with_components(2, &["u", "u"]),
            Err(BasisError::DuplicateComponent(_))
        ));
    }

    #[test]
    fn test_mul_vector_and_matrix() {
        let mut z = BasisFunctionsMatrix::new(3);
        z.enrich(vector_from_slice(&[1.0, 0.0, 1.0]));
        z.enrich(vector_from_slice(&[0.0, 2.0, 0.0]));

        let backend = Backend::default();
        let u = z.mul_vector(&backend, &vector_from_slice(&[3.0, 0.5])).unwrap();
        assert_eq!(u[[0]], 3.0);
        assert_eq!(u[[1]], 1.0);
        assert_eq!(u[[2]], 3.0);

        assert!(matches!(
            z.mul_vector(&backend, &vector_from_slice(&[1.0])),
            Err(BasisError::CoefficientLength { expected: 2, actual: 1 })
        ));

        let reduced: DTensor<f64, 2> = tensor![[1.0], [1.0]];
        let zm = z.mul_matrix(&backend, &reduced).unwrap();
        assert_eq!(*zm.shape(), (3, 1));
        assert_eq!(zm[[1, 0]], 2.0);
    }

    #[test]
    fn test_gram_matrix_with_inner_product() {
        let mut z = BasisFunctionsMatrix::new(2);
        z.enrich(vector_from_slice(&[1.0, 0.0]));
        z.enrich(vector_from_slice(&[1.0, 1.0]));

        let x: DTensor<f64, 2> = tensor![[2.0, 0.0], [0.0, 1.0]];
        let g = z.gram_matrix(&NalgebraBackend, Some(&x));
        assert_eq!(g[[0, 0]], 2.0);
        assert_eq!(g[[0, 1]], 2.0);
        assert_eq!(g[[1, 0]], 2.0);
        assert_eq!(g[[1, 1]], 3.0);

        let euclid = z.gram_matrix(&NalgebraBackend, None);
        assert_eq!(euclid[[0, 1]], 1.0);
    }

    #[test]
    fn test_vec_is_a_container() {
        let mut v: Vec<DTensor<f64, 1>> = Vec::new();
        assert!(BasisContainer::is_empty(&v));
        v.enrich(vector_from_slice(&[1.0]));
        assert_eq!(BasisContainer::len(&v), 1);
    }
}
