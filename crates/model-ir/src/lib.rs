// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! Read-only access to ONNX computation graphs.
//!
//! The crate decodes the subset of `onnx.proto` needed for static analysis
//! and exposes it through a small accessor:
//!
//! - [`GraphNode`]: operator type, ordered input/output names, attributes.
//! - [`Initializer`]: a named constant tensor (weights, biases) and its values.
//! - [`ModelGraph`]: the node list plus shape and initializer lookups, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`GraphLoader`]: loads `.onnx` files via memory-mapped I/O.
//!
//! Shape lookups never fail: a tensor whose shape cannot be determined from
//! declared value-info, graph inputs/outputs, initializers or the producing
//! node simply has no shape.
//!
//! # Example
//! ```no_run
//! use model_ir::GraphLoader;
//! use std::path::Path;
//!
//! let graph = GraphLoader::load(Path::new("./models/mobilenet.onnx")).unwrap();
//! for node in graph.nodes() {
//!     let out = node.primary_output().unwrap_or_default();
//!     println!("{} -> {:?}", node.summary(), graph.shape_of(out));
//! }
//! ```

mod error;
pub mod graph;
mod initializer;
mod loader;
mod node;
pub mod proto;
mod shapes;

pub use error::GraphLoadError;
pub use graph::{LoadOptions, ModelGraph};
pub use initializer::Initializer;
pub use loader::GraphLoader;
pub use node::{AttributeValue, GraphNode, TensorSummary};
