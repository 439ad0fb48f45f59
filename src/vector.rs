//! Vector type and validation

use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// A point in n-dimensional space.
///
/// Coordinates are immutable and reference counted, so cloning a `Vector`
/// shares the allocation. The stored record and the auxiliary index hold
/// the same coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Arc<[f32]>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data: data.into() }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Compute the L2 norm (magnitude) of the vector
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Create a unit-length copy of the vector.
    pub fn normalized(&self) -> Result<Vector> {
        let norm = self.norm();
        if norm == 0.0 {
            return Err(VectorStoreError::invalid_vector(
                "cannot normalize zero vector",
            ));
        }
        Ok(Vector::new(self.data.iter().map(|x| x / norm).collect()))
    }

    /// Reject vectors that would silently corrupt distance comparisons:
    /// empty vectors and vectors holding NaN or infinite coordinates.
    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(VectorStoreError::invalid_vector("vector is empty"));
        }
        if let Some((pos, value)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, x)| !x.is_finite())
        {
            return Err(VectorStoreError::invalid_vector(format!(
                "non-finite coordinate {} at position {}",
                value, pos
            )));
        }
        Ok(())
    }

    /// Check the vector against an expected dimensionality.
    pub fn check_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

impl From<&[f32]> for Vector {
    fn from(data: &[f32]) -> Self {
        Self { data: data.into() }
    }
}

impl<const N: usize> From<[f32; N]> for Vector {
    fn from(data: [f32; N]) -> Self {
        Self {
            data: Arc::from(&data[..]),
        }
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}

/// Parse a vector from a comma-separated string such as `"1.0, 2.0, 3.0"`.
impl FromStr for Vector {
    type Err = VectorStoreError;

    fn from_str(s: &str) -> Result<Self> {
        let data = s
            .split(',')
            .map(|x| {
                x.trim().parse::<f32>().map_err(|_| {
                    VectorStoreError::invalid_vector(format!("invalid float: {:?}", x.trim()))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        Ok(Vector::new(data))
    }
}
