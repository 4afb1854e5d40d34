// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error and warning types for the analyzer.

use model_ir::GraphLoadError;
use std::path::PathBuf;

/// Errors that abort an analysis or a report load.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The graph could not be loaded.
    #[error("graph error: {0}")]
    Graph(#[from] GraphLoadError),

    /// A report mapping does not match the record layout.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A report file could not be read or written.
    #[error("report I/O failed for '{path}': {source}")]
    ReportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file is not valid JSON.
    #[error("report '{path}' is not valid JSON: {source}")]
    ReportJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// A serialized record that does not match the expected layout.
///
/// `node` is the position of the offending entry in the `nodes` list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("report must be an object with a 'nodes' list")]
    MissingNodes,

    #[error("unexpected top-level key '{0}'")]
    UnknownTopLevelKey(String),

    #[error("node #{node}: expected an object")]
    NotAnObject { node: usize },

    #[error("node #{node}: missing key '{key}'")]
    MissingKey { node: usize, key: &'static str },

    #[error("node #{node}: unknown key '{key}'")]
    UnknownKey { node: usize, key: String },

    #[error("node #{node}: field '{key}' has the wrong type: {detail}")]
    WrongType {
        node: usize,
        key: &'static str,
        detail: String,
    },

    #[error("node #{node}: {detail}")]
    InvariantViolation { node: usize, detail: String },
}

/// A per-node problem that degraded the record instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisWarning {
    /// No shape could be determined for a tensor.
    #[error("node '{node}': shape of tensor '{tensor}' is unknown")]
    UnresolvedShape { node: String, tensor: String },

    /// No cost rule is registered for the operator type.
    #[error("node '{node}': no cost rule for operator '{op_type}'")]
    UnknownOperator { node: String, op_type: String },
}
