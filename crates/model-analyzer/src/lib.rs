// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-analyzer
//!
//! Static cost analysis of ONNX graphs for pruning decisions.
//!
//! For every operator node the analyzer derives input/output shapes, the
//! weight and bias tensors, a FLOP estimate, the parameter count, whether
//! the weight is prunable and how many of its elements are already zero.
//! The per-node records form a [`ModelRecord`] with a stable,
//! round-trippable JSON form.
//!
//! - [`cost`]: the pluggable operator cost table ([`CostModel`], [`CostRule`]).
//! - [`NodeAnalyzer`]: one node → one [`NodeRecord`].
//! - [`ModelAnalyzer`]: all nodes → [`ModelRecord`], with persistence.
//!
//! Analysis never fails because of a single node: missing shapes and
//! unknown operators yield [`Estimate::Unknown`] FLOPs and an
//! [`AnalysisWarning`].
//!
//! # Example
//! ```no_run
//! use model_analyzer::{AnalyzerConfig, ModelAnalyzer, ModelRecord};
//! use std::path::Path;
//!
//! let analyzer = ModelAnalyzer::new(AnalyzerConfig::default());
//! let live = analyzer.analyze_file(Path::new("model.onnx")).unwrap();
//! let golden = ModelRecord::load(Path::new("model.json")).unwrap();
//! assert_eq!(live, golden);
//! ```

mod config;
pub mod cost;
mod error;
mod estimate;
mod model;
mod node;
mod record;

pub use config::AnalyzerConfig;
pub use cost::{CostModel, CostRule};
pub use error::{AnalysisWarning, AnalyzerError, SchemaError};
pub use estimate::Estimate;
pub use model::{ModelAnalyzer, ModelRecord, OpTotals};
pub use node::{node_id, NodeAnalyzer};
pub use record::{NodeRecord, NODE_FIELDS};
