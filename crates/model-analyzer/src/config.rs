// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Analyzer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! symbolic_dim = 1
//! strict_shapes = false
//! sort_nodes = false
//!
//! [op_factors]
//! Softmax = 5
//! Gelu = 8
//! ```

use crate::AnalyzerError;
use model_ir::LoadOptions;
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the model analyzer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Value substituted for symbolic dimensions (e.g., a dynamic batch axis).
    pub symbolic_dim: usize,
    /// When set, symbolic dimensions make the whole shape unknown instead.
    pub strict_shapes: bool,
    /// Sort the analyzed nodes by id instead of keeping graph order.
    pub sort_nodes: bool,
    /// Per-operator FLOP factors for element-wise rules. Entries override the
    /// built-in table and may register additional operator types.
    pub op_factors: BTreeMap<String, u64>,
}

impl AnalyzerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AnalyzerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, AnalyzerError> {
        toml::from_str(toml_str)
            .map_err(|e| AnalyzerError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, AnalyzerError> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalyzerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Graph loading options derived from this config.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            symbolic_dim: (!self.strict_shapes).then_some(self.symbolic_dim),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            symbolic_dim: 1,
            strict_shapes: false,
            sort_nodes: false,
            op_factors: BTreeMap::new(),
        }
    }
}
