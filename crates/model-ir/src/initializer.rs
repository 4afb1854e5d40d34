// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constant tensors embedded in the graph (learned weights and biases).

use crate::proto::{data_location, TensorProto};
use crate::GraphLoadError;
use tensor_core::{DType, Shape, TensorData};

/// A named constant tensor with its shape and stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    /// Tensor name, referenced by node inputs.
    pub name: String,
    /// Tensor shape.
    pub shape: Shape,
    /// Element type, if the graph declares a known one.
    pub dtype: Option<DType>,
    /// Stored values.
    pub data: TensorData,
}

impl Initializer {
    /// Converts a `TensorProto`, taking ownership of its value buffers.
    pub fn from_proto(proto: TensorProto) -> Result<Self, GraphLoadError> {
        let shape = Shape::from_i64(&proto.dims).ok_or_else(|| GraphLoadError::InvalidInitializer {
            name: proto.name.clone(),
            detail: format!("negative dimension in {:?}", proto.dims),
        })?;
        let dtype = DType::from_onnx(proto.data_type);

        let data = if proto.data_location == data_location::EXTERNAL {
            TensorData::External
        } else if !proto.raw_data.is_empty() {
            TensorData::Raw(proto.raw_data)
        } else if !proto.float_data.is_empty() {
            TensorData::Floats(proto.float_data)
        } else if !proto.double_data.is_empty() {
            TensorData::Doubles(proto.double_data)
        } else if !proto.int32_data.is_empty() {
            TensorData::Int32s(proto.int32_data)
        } else if !proto.int64_data.is_empty() {
            TensorData::Int64s(proto.int64_data)
        } else if !proto.uint64_data.is_empty() {
            TensorData::Uint64s(proto.uint64_data)
        } else {
            TensorData::Empty
        };

        Ok(Self {
            name: proto.name,
            shape,
            dtype,
            data,
        })
    }

    /// Total number of elements, `None` if it overflows a `u64`.
    pub fn num_elements(&self) -> Option<u64> {
        self.shape.num_elements()
    }

    /// Number of elements whose stored value is exactly zero.
    ///
    /// Returns `None` when the values are unavailable or inconsistent with
    /// the shape; the inconsistency is logged, not raised.
    pub fn zeroed_elements(&self) -> Option<u64> {
        let dtype = self.dtype?;
        match self.data.count_zeros(dtype, self.num_elements()?) {
            Ok(zeros) => zeros,
            Err(e) => {
                tracing::warn!("initializer '{}': cannot read values: {e}", self.name);
                None
            }
        }
    }
}
