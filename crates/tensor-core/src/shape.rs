// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Ordered list of dimension sizes of a tensor.
///
/// Shapes are immutable once created. They serialize as a plain JSON array
/// (`[16, 3, 3, 3]`), which is the layout used in analysis reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), Some(24));
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Builds a shape from signed ONNX dimensions.
    ///
    /// Returns `None` if any dimension is negative (ONNX uses `-1` for
    /// "unknown" in a few places).
    pub fn from_i64(dims: &[i64]) -> Option<Self> {
        dims.iter()
            .map(|&d| usize::try_from(d).ok())
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements, or `None` if it does not fit
    /// in a `u64`.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn num_elements(&self) -> Option<u64> {
        checked_product(&self.dims)
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns the size of the last dimension, if any.
    pub fn last(&self) -> Option<usize> {
        self.dims.last().copied()
    }

    /// Product of the dimensions in `range`, clamped to the shape's rank.
    /// `None` on overflow.
    pub fn product_of(&self, range: std::ops::Range<usize>) -> Option<u64> {
        let end = range.end.min(self.dims.len());
        let start = range.start.min(end);
        checked_product(&self.dims[start..end])
    }

    /// Computes the numpy-style broadcast of two shapes.
    ///
    /// Dimensions are aligned from the right; each pair must be equal or one
    /// of them must be 1. Returns `None` if the shapes are incompatible.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let rank = self.rank().max(other.rank());
        let mut dims = vec![0usize; rank];
        for (i, slot) in dims.iter_mut().rev().enumerate() {
            let a = self.dims.iter().rev().nth(i).copied().unwrap_or(1);
            let b = other.dims.iter().rev().nth(i).copied().unwrap_or(1);
            *slot = match (a, b) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                _ => return None,
            };
        }
        Some(Shape::new(dims))
    }
}

fn checked_product(dims: &[usize]) -> Option<u64> {
    if dims.contains(&0) {
        return Some(0);
    }
    dims.iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(u64::try_from(d).ok()?))
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.num_elements(), Some(1));
    }

    #[test]
    fn test_conv_weight_shape() {
        let s = Shape::new(vec![16, 3, 3, 3]);
        assert_eq!(s.num_elements(), Some(432));
        assert_eq!(s.dim(1), Some(3));
        assert_eq!(s.dim(4), None);
    }

    #[test]
    fn test_from_i64() {
        assert_eq!(Shape::from_i64(&[1, 3, 224, 224]), Some(Shape::new(vec![1, 3, 224, 224])));
        assert_eq!(Shape::from_i64(&[-1, 3]), None);
        assert_eq!(Shape::from_i64(&[]), Some(Shape::scalar()));
    }

    #[test]
    fn test_product_of() {
        let s = Shape::new(vec![2, 3, 4, 5]);
        assert_eq!(s.product_of(1..3), Some(12));
        assert_eq!(s.product_of(1..1), Some(1));
        assert_eq!(s.product_of(2..10), Some(20));
        assert_eq!(s.product_of(7..9), Some(1));
    }

    #[test]
    fn test_element_count_overflow() {
        let s = Shape::new(vec![1 << 33, 1 << 33, 4]);
        assert_eq!(s.num_elements(), None);
        assert_eq!(s.product_of(0..2), None);
        assert_eq!(s.product_of(1..3), Some(1 << 35));
        assert_eq!(Shape::new(vec![1 << 33, 1 << 33, 0]).num_elements(), Some(0));
    }

    #[test]
    fn test_broadcast() {
        let a = Shape::new(vec![1, 3]);
        let b = Shape::new(vec![4, 3]);
        assert_eq!(a.broadcast(&b), Some(Shape::new(vec![4, 3])));

        let c = Shape::new(vec![8, 1, 5]);
        assert_eq!(a.broadcast(&c), None);
        assert_eq!(
            Shape::new(vec![8, 1, 3]).broadcast(&Shape::new(vec![5, 1])),
            Some(Shape::new(vec![8, 5, 3]))
        );
        assert_eq!(Shape::vector(5).broadcast(&Shape::new(vec![2, 1])), Some(Shape::matrix(2, 5)));

        let d = Shape::new(vec![4, 2]);
        assert_eq!(a.broadcast(&d), None);
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let s = Shape::new(vec![16, 3, 3, 3]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[16,3,3,3]");
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
