// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor element data types, as numbered by `TensorProto.DataType`.

use std::fmt;

/// Enumerates the element types an ONNX tensor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    U8,
    I8,
    U16,
    I16,
    I32,
    I64,
    String,
    Bool,
    F16,
    F64,
    U32,
    U64,
    BF16,
}

impl DType {
    /// Maps an ONNX `TensorProto.DataType` code to a [`DType`].
    ///
    /// Returns `None` for `UNDEFINED` (0), complex types and codes this
    /// crate does not know about.
    pub fn from_onnx(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::F32),
            2 => Some(Self::U8),
            3 => Some(Self::I8),
            4 => Some(Self::U16),
            5 => Some(Self::I16),
            6 => Some(Self::I32),
            7 => Some(Self::I64),
            8 => Some(Self::String),
            9 => Some(Self::Bool),
            10 => Some(Self::F16),
            11 => Some(Self::F64),
            12 => Some(Self::U32),
            13 => Some(Self::U64),
            16 => Some(Self::BF16),
            _ => None,
        }
    }

    /// Returns the ONNX `TensorProto.DataType` code.
    pub fn onnx_code(self) -> i32 {
        match self {
            Self::F32 => 1,
            Self::U8 => 2,
            Self::I8 => 3,
            Self::U16 => 4,
            Self::I16 => 5,
            Self::I32 => 6,
            Self::I64 => 7,
            Self::String => 8,
            Self::Bool => 9,
            Self::F16 => 10,
            Self::F64 => 11,
            Self::U32 => 12,
            Self::U64 => 13,
            Self::BF16 => 16,
        }
    }

    /// Size of one element in a raw little-endian buffer, or `None` for
    /// variable-width types (strings).
    pub fn size_bytes(self) -> Option<usize> {
        match self {
            Self::U8 | Self::I8 | Self::Bool => Some(1),
            Self::U16 | Self::I16 | Self::F16 | Self::BF16 => Some(2),
            Self::F32 | Self::I32 | Self::U32 => Some(4),
            Self::F64 | Self::I64 | Self::U64 => Some(8),
            Self::String => None,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::String => "string",
            Self::Bool => "bool",
            Self::F16 => "f16",
            Self::F64 => "f64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::BF16 => "bf16",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onnx_code_roundtrip() {
        for code in [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16] {
            let dtype = DType::from_onnx(code).unwrap();
            assert_eq!(dtype.onnx_code(), code);
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(DType::from_onnx(0), None);
        assert_eq!(DType::from_onnx(14), None);
        assert_eq!(DType::from_onnx(99), None);
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(DType::F32.size_bytes(), Some(4));
        assert_eq!(DType::F16.size_bytes(), Some(2));
        assert_eq!(DType::I64.size_bytes(), Some(8));
        assert_eq!(DType::Bool.size_bytes(), Some(1));
        assert_eq!(DType::String.size_bytes(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::BF16.to_string(), "bf16");
    }
}
