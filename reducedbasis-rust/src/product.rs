//! Theta-weighted products of affine expansions
//!
//! [`product`] evaluates a parametrized online operator from its affine
//! expansion:
//!
//! - order 1: `Σ_q θ_q A_q`
//! - order 2: `Σ_{q1,q2} θ1_q1 A_{q1,q2} θ2_q2`
//!
//! The operator overloads used for accumulation return plain values, so the
//! size tags and component maps of the expansion are copied onto the result
//! afterwards. The result is wrapped in [`ProductOutput`]; [`sum`] unwraps it.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::affine_expansion::AffineExpansionStorage;
use crate::online::{ComponentMaps, OnlineOperator, OnlineSize, OperatorKind};

/// Error types for affine products
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Affine expansions of order {order} are not supported (expected 1 or 2)")]
    UnsupportedExpansionOrder { order: usize },
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid operand at {index:?}: {reason}")]
    InvalidOperandKind { index: Vec<usize>, reason: String },
    #[error("Inconsistent metadata: {0}")]
    InconsistentMetadata(String),
    #[error("Operand at {index:?} has shape {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        index: Vec<usize>,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Products of {0} operands are not implemented")]
    NotImplemented(OperatorKind),
}

/// Result of [`product`], distinguished from a raw operator
#[derive(Debug, Clone)]
pub struct ProductOutput {
    value: OnlineOperator,
}

impl ProductOutput {
    pub fn value(&self) -> &OnlineOperator {
        &self.value
    }

    pub fn into_inner(self) -> OnlineOperator {
        self.value
    }
}

/// Unwrap the value of a product
pub fn sum(output: ProductOutput) -> OnlineOperator {
    output.into_inner()
}

/// Size tags copied from the expansion onto the result
#[derive(Debug, Clone, Default, PartialEq)]
struct SizeTags {
    m: Option<OnlineSize>,
    n: Option<OnlineSize>,
}

impl SizeTags {
    fn of(operator: &OnlineOperator) -> Self {
        match operator {
            OnlineOperator::Matrix(a) => SizeTags {
                m: a.m().cloned(),
                n: a.n().cloned(),
            },
            OnlineOperator::Vector(v) => SizeTags {
                m: None,
                n: v.n().cloned(),
            },
            _ => SizeTags::default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.m.is_none() && self.n.is_none()
    }
}

/// Compute the theta-weighted product of an affine expansion
///
/// # Arguments
/// * `thetas` - Weights along the first axis
/// * `operators` - Affine expansion of order 1 or 2
/// * `thetas2` - Weights along the second axis; required for order 2, must be
///   `None` for order 1
///
/// # Errors
/// * `UnsupportedExpansionOrder` - order other than 1 or 2
/// * `LengthMismatch` - weight count differs from the expansion shape
/// * `InvalidOperandKind` - unset or non-homogeneous entries
/// * `DimensionMismatch` - entries of one kind with different shapes
/// * `InconsistentMetadata` - conflicting size tags, or partial component maps
/// * `NotImplemented` - `Function` operands
pub fn product(
    thetas: &[f64],
    operators: &AffineExpansionStorage,
    thetas2: Option<&[f64]>,
) -> Result<ProductOutput, ProductError> {
    let shape = operators.shape().to_vec();
    let kind = check_operands(operators)?;

    let mut value = match shape.len() {
        1 => {
            if let Some(t2) = thetas2 {
                return Err(ProductError::LengthMismatch {
                    what: "thetas2 (order 1 takes a single weight sequence)",
                    expected: 0,
                    actual: t2.len(),
                });
            }
            check_length("thetas", shape[0], thetas.len())?;
            debug!(q = shape[0], kind = %kind, "order-1 affine product");
            weighted_sum(thetas, operators)?
        }
        2 => {
            let t2 = thetas2.ok_or(ProductError::LengthMismatch {
                what: "thetas2",
                expected: shape[1],
                actual: 0,
            })?;
            check_length("thetas", shape[0], thetas.len())?;
            check_length("thetas2", shape[1], t2.len())?;
            debug!(q1 = shape[0], q2 = shape[1], kind = %kind, "order-2 affine product");
            bilinear_form(thetas, operators, t2, kind)?
        }
        order => return Err(ProductError::UnsupportedExpansionOrder { order }),
    };

    let (tags, maps) = metadata(operators)?;
    match &mut value {
        OnlineOperator::Matrix(a) => {
            a.set_sizes(tags.m, tags.n);
            a.set_component_maps(maps);
        }
        OnlineOperator::Vector(v) => {
            v.set_size(tags.n);
            v.set_component_maps(maps);
        }
        _ => {}
    }

    Ok(ProductOutput { value })
}

fn check_length(what: &'static str, expected: usize, actual: usize) -> Result<(), ProductError> {
    if expected != actual {
        return Err(ProductError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Multi-index of row-major slot `flat`
fn unravel(flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    let mut rest = flat;
    for axis in (0..shape.len()).rev() {
        if shape[axis] > 0 {
            index[axis] = rest % shape[axis];
            rest /= shape[axis];
        }
    }
    index
}

/// Every slot set, one kind, no functions, one shape
fn check_operands(operators: &AffineExpansionStorage) -> Result<OperatorKind, ProductError> {
    let shape = operators.shape();
    if shape.len() > 2 || shape.is_empty() {
        return Err(ProductError::UnsupportedExpansionOrder { order: shape.len() });
    }
    let mut first: Option<(OperatorKind, Vec<usize>)> = None;
    for (flat, slot) in operators.iter().enumerate() {
        let index = unravel(flat, shape);
        let operator = slot.ok_or_else(|| ProductError::InvalidOperandKind {
            index: index.clone(),
            reason: "entry is unset".to_string(),
        })?;
        let kind = operator.kind();
        if kind == OperatorKind::Function {
            return Err(ProductError::NotImplemented(kind));
        }
        match &first {
            None => first = Some((kind, operator.shape())),
            Some((expected_kind, expected_shape)) => {
                if kind != *expected_kind {
                    return Err(ProductError::InvalidOperandKind {
                        index,
                        reason: format!("{} entry in an expansion of {} entries", kind, expected_kind),
                    });
                }
                let actual = operator.shape();
                if actual != *expected_shape {
                    return Err(ProductError::DimensionMismatch {
                        index,
                        expected: expected_shape.clone(),
                        actual,
                    });
                }
            }
        }
    }
    first.map(|(kind, _)| kind).ok_or_else(empty_expansion)
}

/// Scale-and-accumulate through the operand overloads
fn accumulate(
    acc: Option<OnlineOperator>,
    weight: f64,
    operator: &OnlineOperator,
    index: &[usize],
) -> Result<OnlineOperator, ProductError> {
    let mismatch = |expected: Vec<usize>| ProductError::DimensionMismatch {
        index: index.to_vec(),
        expected,
        actual: operator.shape(),
    };
    let value = match (acc, operator) {
        (None, OnlineOperator::Matrix(a)) => OnlineOperator::Matrix(weight * a),
        (Some(OnlineOperator::Matrix(acc)), OnlineOperator::Matrix(a)) => OnlineOperator::Matrix(
            acc.try_add(&(weight * a))
                .map_err(|_| mismatch(vec![acc.shape().0, acc.shape().1]))?,
        ),
        (None, OnlineOperator::Vector(v)) => OnlineOperator::Vector(weight * v),
        (Some(OnlineOperator::Vector(acc)), OnlineOperator::Vector(v)) => OnlineOperator::Vector(
            acc.try_add(&(weight * v))
                .map_err(|_| mismatch(vec![acc.len()]))?,
        ),
        (None, OnlineOperator::Scalar(s)) => OnlineOperator::Scalar(weight * s),
        (Some(OnlineOperator::Scalar(acc)), OnlineOperator::Scalar(s)) => {
            OnlineOperator::Scalar(acc + weight * s)
        }
        (_, OnlineOperator::Function(_)) => {
            return Err(ProductError::NotImplemented(OperatorKind::Function))
        }
        (Some(acc), other) => {
            return Err(ProductError::InvalidOperandKind {
                index: index.to_vec(),
                reason: format!("{} entry accumulated into a {}", other.kind(), acc.kind()),
            })
        }
    };
    Ok(value)
}

fn empty_expansion() -> ProductError {
    ProductError::InvalidOperandKind {
        index: Vec::new(),
        reason: "affine expansion is empty".to_string(),
    }
}

fn weighted_sum(
    thetas: &[f64],
    operators: &AffineExpansionStorage,
) -> Result<OnlineOperator, ProductError> {
    let mut output = None;
    for (q, (theta, slot)) in thetas.iter().zip(operators.iter()).enumerate() {
        let operator = slot.ok_or_else(|| ProductError::InvalidOperandKind {
            index: vec![q],
            reason: "entry is unset".to_string(),
        })?;
        output = Some(accumulate(output, *theta, operator, &[q])?);
    }
    output.ok_or_else(empty_expansion)
}

fn bilinear_form(
    thetas: &[f64],
    operators: &AffineExpansionStorage,
    thetas2: &[f64],
    kind: OperatorKind,
) -> Result<OnlineOperator, ProductError> {
    let q1 = thetas.len();
    let q2 = thetas2.len();
    let entries: Vec<&OnlineOperator> = operators.iter().flatten().collect();

    if kind == OperatorKind::Scalar {
        // θ1ᵗ M θ2 over a dense numeric grid
        let grid = DMatrix::from_fn(q1, q2, |i, j| entries[i * q2 + j].as_scalar().unwrap_or(0.0));
        let t1 = DVector::from_column_slice(thetas);
        let t2 = DVector::from_column_slice(thetas2);
        return Ok(OnlineOperator::Scalar(t1.dot(&(grid * t2))));
    }

    let mut output = None;
    for (i, theta1) in thetas.iter().enumerate() {
        for (j, theta2) in thetas2.iter().enumerate() {
            output = Some(accumulate(output, theta1 * theta2, entries[i * q2 + j], &[i, j])?);
        }
    }
    output.ok_or_else(empty_expansion)
}

/// Component maps carried by an operator
fn operator_maps(operator: &OnlineOperator) -> Option<&ComponentMaps> {
    match operator {
        OnlineOperator::Matrix(a) => a.component_maps(),
        OnlineOperator::Vector(v) => v.component_maps(),
        _ => None,
    }
}

/// Size tags and component maps of the first operator, checked against the rest
///
/// Later operators may carry no metadata; metadata that is present must agree
/// with the first operator's. Component maps set on the expansion itself take
/// precedence over the operators' own.
fn metadata(
    operators: &AffineExpansionStorage,
) -> Result<(SizeTags, Option<ComponentMaps>), ProductError> {
    let shape = operators.shape();
    let mut first: Option<(SizeTags, Option<&ComponentMaps>)> = None;
    for (flat, operator) in operators.iter().enumerate() {
        let Some(operator) = operator else { continue };
        let tags = SizeTags::of(operator);
        let maps = operator_maps(operator);
        match &first {
            None => first = Some((tags, maps)),
            Some((first_tags, first_maps)) => {
                if !first_tags.is_empty() && !tags.is_empty() && *first_tags != tags {
                    return Err(ProductError::InconsistentMetadata(format!(
                        "size tags of operator {:?} ({:?}, {:?}) conflict with the first operator ({:?}, {:?})",
                        unravel(flat, shape),
                        tags.m,
                        tags.n,
                        first_tags.m,
                        first_tags.n
                    )));
                }
                if let (Some(expected), Some(actual)) = (first_maps, maps) {
                    if *expected != actual {
                        return Err(ProductError::InconsistentMetadata(format!(
                            "component maps of operator {:?} ({:?}) conflict with the first operator ({:?})",
                            unravel(flat, shape),
                            actual.index_to_name,
                            expected.index_to_name
                        )));
                    }
                }
            }
        }
    }
    let (tags, first_maps) = first.unwrap_or_default();

    let maps = match operators.component_maps() {
        Ok(Some(maps)) => Some(maps),
        Ok(None) => first_maps.cloned(),
        Err(present) => {
            return Err(ProductError::InconsistentMetadata(format!(
                "component maps must be all present or all absent, found only {}",
                present.join(", ")
            )));
        }
    };

    Ok((tags, maps))
}

#[cfg(test)]
#[path = "product_tests.rs"]
mod tests;
