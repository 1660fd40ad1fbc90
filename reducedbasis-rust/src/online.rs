//! Dense online (reduced) operators
//!
//! Reduced matrices and vectors are small dense arrays that additionally carry
//! bookkeeping: their reduced sizes (possibly split per named component) and
//! the component-naming maps of the basis they were projected on.
//!
//! The arithmetic overloads (`+`, `* f64`) produce plain values and drop that
//! bookkeeping; code that combines operators (see [`crate::product`]) has to
//! copy it back onto the result.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul};

use mdarray::DTensor;

/// Reduced size of one operator axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnlineSize {
    /// Single unnamed block
    Single(usize),
    /// Named blocks, in basis order
    Components(Vec<(String, usize)>),
}

impl OnlineSize {
    /// Total number of entries along the axis
    pub fn total(&self) -> usize {
        match self {
            OnlineSize::Single(n) => *n,
            OnlineSize::Components(blocks) => blocks.iter().map(|(_, n)| n).sum(),
        }
    }
}

/// Component-naming maps of a (possibly multi-component) reduced basis
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentMaps {
    /// Component index → component name
    pub index_to_name: BTreeMap<usize, String>,
    /// Component name → component index
    pub name_to_index: BTreeMap<String, usize>,
    /// Component name → number of basis functions of that component
    pub name_to_length: BTreeMap<String, usize>,
}

impl ComponentMaps {
    /// Build the maps from `(name, length)` pairs in component order
    pub fn from_lengths<S: AsRef<str>>(components: &[(S, usize)]) -> Self {
        let mut maps = ComponentMaps::default();
        for (index, (name, length)) in components.iter().enumerate() {
            let name = name.as_ref().to_string();
            maps.index_to_name.insert(index, name.clone());
            maps.name_to_index.insert(name.clone(), index);
            maps.name_to_length.insert(name, *length);
        }
        maps
    }
}

/// Error types for online operator construction
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    #[error("Size tag {axis} has total {tagged}, but the operator has {actual} entries along it")]
    SizeTagMismatch {
        axis: &'static str,
        tagged: usize,
        actual: usize,
    },
    #[error("Operator shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
}

/// Kind of an affine expansion operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Matrix,
    Vector,
    Scalar,
    Function,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorKind::Matrix => "matrix",
            OperatorKind::Vector => "vector",
            OperatorKind::Scalar => "scalar",
            OperatorKind::Function => "function",
        };
        f.write_str(name)
    }
}

//==============================================================================
// OnlineMatrix
//==============================================================================

/// Dense reduced matrix
#[derive(Debug, Clone)]
pub struct OnlineMatrix {
    values: DTensor<f64, 2>,
    m: Option<OnlineSize>,
    n: Option<OnlineSize>,
    component_maps: Option<ComponentMaps>,
}

impl OnlineMatrix {
    /// Untagged matrix
    pub fn new(values: DTensor<f64, 2>) -> Self {
        Self {
            values,
            m: None,
            n: None,
            component_maps: None,
        }
    }

    /// Matrix tagged with row size `m` and column size `n`
    pub fn with_sizes(
        values: DTensor<f64, 2>,
        m: OnlineSize,
        n: OnlineSize,
    ) -> Result<Self, OperatorError> {
        let (rows, cols) = *values.shape();
        if m.total() != rows {
            return Err(OperatorError::SizeTagMismatch {
                axis: "M",
                tagged: m.total(),
                actual: rows,
            });
        }
        if n.total() != cols {
            return Err(OperatorError::SizeTagMismatch {
                axis: "N",
                tagged: n.total(),
                actual: cols,
            });
        }
        Ok(Self {
            values,
            m: Some(m),
            n: Some(n),
            component_maps: None,
        })
    }

    pub fn values(&self) -> &DTensor<f64, 2> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        *self.values.shape()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Row size tag
    pub fn m(&self) -> Option<&OnlineSize> {
        self.m.as_ref()
    }

    /// Column size tag
    pub fn n(&self) -> Option<&OnlineSize> {
        self.n.as_ref()
    }

    pub fn component_maps(&self) -> Option<&ComponentMaps> {
        self.component_maps.as_ref()
    }

    pub(crate) fn set_sizes(&mut self, m: Option<OnlineSize>, n: Option<OnlineSize>) {
        self.m = m;
        self.n = n;
    }

    pub(crate) fn set_component_maps(&mut self, maps: Option<ComponentMaps>) {
        self.component_maps = maps;
    }

    /// Shape-checked `self + other`
    pub fn try_add(&self, other: &OnlineMatrix) -> Result<OnlineMatrix, OperatorError> {
        if self.shape() != other.shape() {
            let (a0, a1) = self.shape();
            let (b0, b1) = other.shape();
            return Err(OperatorError::ShapeMismatch {
                left: vec![a0, a1],
                right: vec![b0, b1],
            });
        }
        Ok(self + other)
    }
}

impl Add for &OnlineMatrix {
    type Output = OnlineMatrix;

    /// # Panics
    /// Panics if the shapes differ
    fn add(self, other: &OnlineMatrix) -> OnlineMatrix {
        assert_eq!(
            self.shape(),
            other.shape(),
            "OnlineMatrix shape mismatch: {:?} != {:?}",
            self.shape(),
            other.shape()
        );
        let (m, n) = self.shape();
        OnlineMatrix::new(DTensor::<f64, 2>::from_fn([m, n], |idx| {
            self.values[[idx[0], idx[1]]] + other.values[[idx[0], idx[1]]]
        }))
    }
}

impl Mul<f64> for &OnlineMatrix {
    type Output = OnlineMatrix;

    fn mul(self, scalar: f64) -> OnlineMatrix {
        let (m, n) = self.shape();
        OnlineMatrix::new(DTensor::<f64, 2>::from_fn([m, n], |idx| {
            scalar * self.values[[idx[0], idx[1]]]
        }))
    }
}

impl Mul<&OnlineMatrix> for f64 {
    type Output = OnlineMatrix;

    fn mul(self, matrix: &OnlineMatrix) -> OnlineMatrix {
        matrix * self
    }
}

//==============================================================================
// OnlineVector
//==============================================================================

/// Dense reduced vector
#[derive(Debug, Clone)]
pub struct OnlineVector {
    values: DTensor<f64, 1>,
    n: Option<OnlineSize>,
    component_maps: Option<ComponentMaps>,
}

impl OnlineVector {
    /// Untagged vector
    pub fn new(values: DTensor<f64, 1>) -> Self {
        Self {
            values,
            n: None,
            component_maps: None,
        }
    }

    /// Vector tagged with size `n`
    pub fn with_size(values: DTensor<f64, 1>, n: OnlineSize) -> Result<Self, OperatorError> {
        if n.total() != values.len() {
            return Err(OperatorError::SizeTagMismatch {
                axis: "N",
                tagged: n.total(),
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            n: Some(n),
            component_maps: None,
        })
    }

    pub fn values(&self) -> &DTensor<f64, 1> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }

    pub fn get(&self, i: usize) -> f64 {
        self.values[[i]]
    }

    /// Size tag
    pub fn n(&self) -> Option<&OnlineSize> {
        self.n.as_ref()
    }

    pub fn component_maps(&self) -> Option<&ComponentMaps> {
        self.component_maps.as_ref()
    }

    pub(crate) fn set_size(&mut self, n: Option<OnlineSize>) {
        self.n = n;
    }

    pub(crate) fn set_component_maps(&mut self, maps: Option<ComponentMaps>) {
        self.component_maps = maps;
    }

    /// Shape-checked `self + other`
    pub fn try_add(&self, other: &OnlineVector) -> Result<OnlineVector, OperatorError> {
        if self.len() != other.len() {
            return Err(OperatorError::ShapeMismatch {
                left: vec![self.len()],
                right: vec![other.len()],
            });
        }
        Ok(self + other)
    }
}

impl Add for &OnlineVector {
    type Output = OnlineVector;

    /// # Panics
    /// Panics if the lengths differ
    fn add(self, other: &OnlineVector) -> OnlineVector {
        assert_eq!(
            self.len(),
            other.len(),
            "OnlineVector length mismatch: {} != {}",
            self.len(),
            other.len()
        );
        OnlineVector::new(DTensor::<f64, 1>::from_fn([self.len()], |idx| {
            self.values[[idx[0]]] + other.values[[idx[0]]]
        }))
    }
}

impl Mul<f64> for &OnlineVector {
    type Output = OnlineVector;

    fn mul(self, scalar: f64) -> OnlineVector {
        OnlineVector::new(DTensor::<f64, 1>::from_fn([self.len()], |idx| {
            scalar * self.values[[idx[0]]]
        }))
    }
}

impl Mul<&OnlineVector> for f64 {
    type Output = OnlineVector;

    fn mul(self, vector: &OnlineVector) -> OnlineVector {
        vector * self
    }
}

//==============================================================================
// OnlineFunction / OnlineOperator
//==============================================================================

/// Reduced solution (coefficients with respect to a reduced basis)
#[derive(Debug, Clone)]
pub struct OnlineFunction {
    vector: OnlineVector,
}

impl OnlineFunction {
    pub fn new(vector: OnlineVector) -> Self {
        Self { vector }
    }

    pub fn vector(&self) -> &OnlineVector {
        &self.vector
    }
}

/// One operand of an affine expansion
#[derive(Debug, Clone)]
pub enum OnlineOperator {
    Matrix(OnlineMatrix),
    Vector(OnlineVector),
    Scalar(f64),
    Function(OnlineFunction),
}

impl OnlineOperator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            OnlineOperator::Matrix(_) => OperatorKind::Matrix,
            OnlineOperator::Vector(_) => OperatorKind::Vector,
            OnlineOperator::Scalar(_) => OperatorKind::Scalar,
            OnlineOperator::Function(_) => OperatorKind::Function,
        }
    }

    /// Array shape (empty for scalars)
    pub fn shape(&self) -> Vec<usize> {
        match self {
            OnlineOperator::Matrix(m) => {
                let (rows, cols) = m.shape();
                vec![rows, cols]
            }
            OnlineOperator::Vector(v) => vec![v.len()],
            OnlineOperator::Scalar(_) => Vec::new(),
            OnlineOperator::Function(f) => vec![f.vector().len()],
        }
    }

    pub fn as_matrix(&self) -> Option<&OnlineMatrix> {
        match self {
            OnlineOperator::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&OnlineVector> {
        match self {
            OnlineOperator::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            OnlineOperator::Scalar(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<OnlineMatrix> for OnlineOperator {
    fn from(m: OnlineMatrix) -> Self {
        OnlineOperator::Matrix(m)
    }
}

impl From<OnlineVector> for OnlineOperator {
    fn from(v: OnlineVector) -> Self {
        OnlineOperator::Vector(v)
    }
}

impl From<f64> for OnlineOperator {
    fn from(s: f64) -> Self {
        OnlineOperator::Scalar(s)
    }
}

impl From<OnlineFunction> for OnlineOperator {
    fn from(f: OnlineFunction) -> Self {
        OnlineOperator::Function(f)
    }
}
