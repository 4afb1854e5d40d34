// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Shape and element-type primitives shared by the graph loader and the
//! analyzer.
//!
//! This crate provides:
//! - [`Shape`]: an ordered list of dimension sizes with element counting and
//!   broadcasting helpers.
//! - [`DType`]: the ONNX tensor element types.
//! - [`TensorData`]: the stored values of a constant tensor, in whichever
//!   encoding the graph file used, with zero counting for sparsity reports.
//!
//! No arithmetic is ever executed on tensor values here: the analyzer only
//! needs shapes and the number of exactly-zero elements.

mod data;
mod dtype;
mod error;
mod shape;

pub use data::TensorData;
pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
