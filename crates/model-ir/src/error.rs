// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph loading and validation.

use std::path::PathBuf;

/// Errors that make a graph unusable for analysis.
///
/// Anything that goes wrong *inside* an otherwise well-formed graph (an
/// unknown operator, a tensor without shape information) is not an error at
/// this level; see the analyzer's degradation rules.
#[derive(Debug, thiserror::Error)]
pub enum GraphLoadError {
    /// The graph file could not be opened or read.
    #[error("failed to read graph file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a valid ONNX protobuf message.
    #[error("failed to decode ONNX model: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The model container has no graph.
    #[error("model contains no graph")]
    MissingGraph,

    /// The graph declares no nodes.
    #[error("graph '{0}' contains no nodes")]
    EmptyGraph(String),

    /// A node is structurally invalid (e.g., no operator type).
    #[error("invalid node #{index} '{name}': {detail}")]
    InvalidNode {
        index: usize,
        name: String,
        detail: String,
    },

    /// An initializer is structurally invalid.
    #[error("invalid initializer '{name}': {detail}")]
    InvalidInitializer { name: String, detail: String },
}
