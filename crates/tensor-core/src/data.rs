// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stored values of constant tensors.
//!
//! A graph file may encode constant values in several ways: a little-endian
//! `raw_data` blob, or one of the typed repeated fields. [`TensorData`] keeps
//! whichever encoding was used and answers the only question the analyzer
//! asks of the values: how many elements are exactly zero.

use crate::{DType, TensorError};

/// Values of a constant tensor, in their on-disk encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// Little-endian fixed-width elements.
    Raw(Vec<u8>),
    /// `float_data`.
    Floats(Vec<f32>),
    /// `double_data`.
    Doubles(Vec<f64>),
    /// `int32_data`; also carries 8/16-bit ints, bools and the bit patterns
    /// of f16 / bf16 elements.
    Int32s(Vec<i32>),
    /// `int64_data`.
    Int64s(Vec<i64>),
    /// `uint64_data`; also carries u32 elements.
    Uint64s(Vec<u64>),
    /// Values live in an external file that is not read.
    External,
    /// No values are stored.
    Empty,
}

impl TensorData {
    /// Counts elements whose value is exactly zero (`-0.0` included).
    ///
    /// Returns `Ok(None)` when the values are not available (external data,
    /// no data, or string tensors), and an error when the stored values do
    /// not agree with `num_elements` or cannot be addressed in memory.
    pub fn count_zeros(&self, dtype: DType, num_elements: u64) -> Result<Option<u64>, TensorError> {
        if dtype == DType::String {
            return Ok(None);
        }
        match self {
            Self::External => return Ok(None),
            Self::Empty => return Ok((num_elements == 0).then_some(0)),
            _ => {}
        }
        let num_elements =
            usize::try_from(num_elements).map_err(|_| TensorError::TooLarge { num_elements })?;
        match self {
            Self::External | Self::Empty => Ok(None),
            Self::Raw(bytes) => count_raw_zeros(bytes, dtype, num_elements).map(Some),
            Self::Floats(v) => count_typed(v.as_slice(), num_elements, |x| *x == 0.0),
            Self::Doubles(v) => count_typed(v.as_slice(), num_elements, |x| *x == 0.0),
            Self::Int32s(v) => match dtype {
                DType::F16 | DType::BF16 => count_typed(v.as_slice(), num_elements, |x| x & 0x7fff == 0),
                _ => count_typed(v.as_slice(), num_elements, |x| *x == 0),
            },
            Self::Int64s(v) => count_typed(v.as_slice(), num_elements, |x| *x == 0),
            Self::Uint64s(v) => count_typed(v.as_slice(), num_elements, |x| *x == 0),
        }
    }
}

fn count_typed<T>(
    values: &[T],
    expected: usize,
    is_zero: impl Fn(&T) -> bool,
) -> Result<Option<u64>, TensorError> {
    if values.len() != expected {
        return Err(TensorError::ElementCountMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(Some(values.iter().filter(|v| is_zero(v)).count() as u64))
}

fn count_raw_zeros(bytes: &[u8], dtype: DType, num_elements: usize) -> Result<u64, TensorError> {
    let width = dtype
        .size_bytes()
        .ok_or(TensorError::UnsupportedDType { dtype })?;
    let expected = num_elements
        .checked_mul(width)
        .ok_or(TensorError::TooLarge {
            num_elements: num_elements as u64,
        })?;
    if bytes.len() != expected {
        return Err(TensorError::BufferSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let chunks = bytes.chunks_exact(width);
    let zeros = match dtype {
        // Floats compare equal to zero regardless of the sign bit.
        DType::F16 | DType::BF16 => chunks
            .filter(|c| u16::from_le_bytes([c[0], c[1]]) & 0x7fff == 0)
            .count(),
        DType::F32 => chunks
            .filter(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) & 0x7fff_ffff == 0)
            .count(),
        DType::F64 => chunks
            .filter(|c| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(c);
                u64::from_le_bytes(buf) & 0x7fff_ffff_ffff_ffff == 0
            })
            .count(),
        _ => chunks.filter(|c| c.iter().all(|&b| b == 0)).count(),
    };
    Ok(zeros as u64)
}
