//! Storage for affine expansions of online operators
//!
//! An affine expansion of order 1 is a sequence of Q operators; order 2 is a
//! Q1×Q2 grid. Entries are stored row-major and may be left unset while the
//! expansion is being assembled.

use std::collections::BTreeMap;

use crate::online::{ComponentMaps, OnlineOperator};

/// Error types for affine expansion storage
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error("Index {index:?} has {actual} axes, expansion has {expected}")]
    IndexRank { index: Vec<usize>, expected: usize, actual: usize },
    #[error("Index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },
    #[error("Grid rows have different lengths: row {row} has {actual}, expected {expected}")]
    RaggedGrid { row: usize, expected: usize, actual: usize },
}

/// Row-major storage of an affine expansion
#[derive(Debug, Clone)]
pub struct AffineExpansionStorage {
    shape: Vec<usize>,
    content: Vec<Option<OnlineOperator>>,
    index_to_name: Option<BTreeMap<usize, String>>,
    name_to_index: Option<BTreeMap<String, usize>>,
    name_to_length: Option<BTreeMap<String, usize>>,
}

impl AffineExpansionStorage {
    /// Empty storage of the given shape
    pub fn new(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            content: vec![None; len],
            index_to_name: None,
            name_to_index: None,
            name_to_length: None,
        }
    }

    /// Order-1 expansion from a sequence of operators
    pub fn from_operators<I>(operators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OnlineOperator>,
    {
        let content: Vec<Option<OnlineOperator>> =
            operators.into_iter().map(|op| Some(op.into())).collect();
        Self {
            shape: vec![content.len()],
            content,
            index_to_name: None,
            name_to_index: None,
            name_to_length: None,
        }
    }

    /// Order-2 expansion from a grid given row by row
    pub fn from_grid<R, T>(rows: Vec<R>) -> Result<Self, ExpansionError>
    where
        R: IntoIterator<Item = T>,
        T: Into<OnlineOperator>,
    {
        let mut content = Vec::new();
        let mut cols = None;
        let n_rows = rows.len();
        for (row, entries) in rows.into_iter().enumerate() {
            let before = content.len();
            content.extend(entries.into_iter().map(|op| Some(op.into())));
            let actual = content.len() - before;
            match cols {
                None => cols = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(ExpansionError::RaggedGrid {
                        row,
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            shape: vec![n_rows, cols.unwrap_or(0)],
            content,
            index_to_name: None,
            name_to_index: None,
            name_to_length: None,
        })
    }

    /// Number of axes (1 for a sequence, 2 for a grid)
    pub fn order(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn flat_index(&self, index: &[usize]) -> Result<usize, ExpansionError> {
        if index.len() != self.shape.len() {
            return Err(ExpansionError::IndexRank {
                index: index.to_vec(),
                expected: self.shape.len(),
                actual: index.len(),
            });
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return Err(ExpansionError::IndexOutOfBounds {
                    index: index.to_vec(),
                    shape: self.shape.clone(),
                });
            }
            flat = flat * n + i;
        }
        Ok(flat)
    }

    pub fn set(
        &mut self,
        index: &[usize],
        operator: impl Into<OnlineOperator>,
    ) -> Result<(), ExpansionError> {
        let flat = self.flat_index(index)?;
        self.content[flat] = Some(operator.into());
        Ok(())
    }

    /// Entry at `index`, `None` while unset
    pub fn get(&self, index: &[usize]) -> Result<Option<&OnlineOperator>, ExpansionError> {
        let flat = self.flat_index(index)?;
        Ok(self.content[flat].as_ref())
    }

    /// Slots in row-major order
    pub fn iter(&self) -> impl Iterator<Item = Option<&OnlineOperator>> {
        self.content.iter().map(|op| op.as_ref())
    }

    /// Attach all three component maps
    pub fn set_component_maps(&mut self, maps: ComponentMaps) {
        self.index_to_name = Some(maps.index_to_name);
        self.name_to_index = Some(maps.name_to_index);
        self.name_to_length = Some(maps.name_to_length);
    }

    pub fn set_index_to_name(&mut self, map: BTreeMap<usize, String>) {
        self.index_to_name = Some(map);
    }

    pub fn set_name_to_index(&mut self, map: BTreeMap<String, usize>) {
        self.name_to_index = Some(map);
    }

    pub fn set_name_to_length(&mut self, map: BTreeMap<String, usize>) {
        self.name_to_length = Some(map);
    }

    /// Component maps, or `Err(present)` listing which maps are set when only
    /// some of them are
    pub fn component_maps(&self) -> Result<Option<ComponentMaps>, Vec<&'static str>> {
        match (&self.index_to_name, &self.name_to_index, &self.name_to_length) {
            (Some(a), Some(b), Some(c)) => Ok(Some(ComponentMaps {
                index_to_name: a.clone(),
                name_to_index: b.clone(),
                name_to_length: c.clone(),
            })),
            (None, None, None) => Ok(None),
            (a, b, c) => {
                let mut present = Vec::new();
                if a.is_some() {
                    present.push("index_to_name");
                }
                if b.is_some() {
                    present.push("name_to_index");
                }
                if c.is_some() {
                    present.push("name_to_length");
                }
                Err(present)
            }
        }
    }
}
