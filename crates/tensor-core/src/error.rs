// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor value decoding.

/// Errors that can occur while interpreting stored tensor values.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The raw buffer size does not match the element count and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A typed value list holds a different number of elements than the shape.
    #[error("element count mismatch: expected {expected} values, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// The element count or byte size does not fit in memory.
    #[error("tensor of {num_elements} elements is too large to decode")]
    TooLarge { num_elements: u64 },

    /// The element type has no fixed-width binary encoding.
    #[error("unsupported dtype {dtype} for raw decoding")]
    UnsupportedDType { dtype: crate::DType },
}
