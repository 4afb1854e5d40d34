// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Whole-model analysis and the report format.
//!
//! # Report Format
//! ```json
//! {
//!   "nodes": [
//!     { "id": "conv1_out", "op_type": "Conv", "flops": 27712, "params": 448, ... }
//!   ]
//! }
//! ```
//!
//! Reports are written pretty-printed with sorted keys and a trailing
//! newline, so analyzing the same graph twice yields identical bytes.
//! Totals are derived from the nodes on demand and never stored.

use crate::cost::CostModel;
use crate::node::NodeAnalyzer;
use crate::{AnalysisWarning, AnalyzerConfig, AnalyzerError, NodeRecord, SchemaError};
use model_ir::{graph::Validated, GraphLoader, ModelGraph};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Analyzes every node of a graph.
///
/// # Example
/// ```no_run
/// use model_analyzer::{AnalyzerConfig, ModelAnalyzer};
/// use std::path::Path;
///
/// let analyzer = ModelAnalyzer::new(AnalyzerConfig::default());
/// let report = analyzer.analyze_file(Path::new("resnet18.onnx")).unwrap();
/// println!("{}", report.summary());
/// report.persist(Path::new("resnet18.json")).unwrap();
/// ```
#[derive(Debug)]
pub struct ModelAnalyzer {
    config: AnalyzerConfig,
    costs: CostModel,
}

impl ModelAnalyzer {
    /// Creates an analyzer with the standard cost table plus the config's
    /// factor overrides.
    pub fn new(config: AnalyzerConfig) -> Self {
        let costs = CostModel::standard().with_factors(&config.op_factors);
        Self { config, costs }
    }

    /// Creates an analyzer with a custom cost table.
    pub fn with_cost_model(config: AnalyzerConfig, costs: CostModel) -> Self {
        Self { config, costs }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.costs
    }

    /// Analyzes every node in definition order.
    pub fn analyze(&self, graph: &ModelGraph<Validated>) -> ModelRecord {
        self.analyze_with_warnings(graph).0
    }

    /// Same as [`analyze`](Self::analyze), also returning per-node warnings.
    pub fn analyze_with_warnings(
        &self,
        graph: &ModelGraph<Validated>,
    ) -> (ModelRecord, Vec<AnalysisWarning>) {
        let analyzer = NodeAnalyzer::new(graph, &self.costs);
        let mut warnings = Vec::new();
        let mut nodes = Vec::with_capacity(graph.num_nodes());
        for (index, node) in graph.nodes().iter().enumerate() {
            let (record, node_warnings) = analyzer.analyze_with_warnings(node, index);
            nodes.push(record);
            warnings.extend(node_warnings);
        }

        let mut record = ModelRecord::new(nodes);
        if self.config.sort_nodes {
            record = record.sorted_by_id();
        }
        tracing::info!(
            "analyzed '{}': {} nodes, {} flops, {} params, {} warnings",
            graph.name,
            record.len(),
            record.total_flops(),
            record.total_params(),
            warnings.len(),
        );
        (record, warnings)
    }

    /// Loads a graph file with the configured options and analyzes it.
    pub fn analyze_file(&self, path: &Path) -> Result<ModelRecord, AnalyzerError> {
        let graph = GraphLoader::load_with(path, &self.config.load_options())?;
        Ok(self.analyze(&graph))
    }
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Per-operator-type totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpTotals {
    pub count: usize,
    pub flops: u64,
    pub unknown_flops: usize,
    pub params: u64,
    pub prunable_params: u64,
    pub prunable_params_zeroed: u64,
}

impl OpTotals {
    fn add(&mut self, node: &NodeRecord) {
        self.count += 1;
        match node.flops.known() {
            Some(flops) => self.flops = self.flops.saturating_add(flops),
            None => self.unknown_flops += 1,
        }
        self.params = self.params.saturating_add(node.params);
        self.prunable_params = self.prunable_params.saturating_add(node.prunable_params);
        self.prunable_params_zeroed = self
            .prunable_params_zeroed
            .saturating_add(node.prunable_params_zeroed);
    }
}

/// The analysis result for a whole model.
///
/// Equality compares the node collections as multisets: two records are
/// equal if they contain the same nodes in any order.
#[derive(Debug, Clone, Default)]
pub struct ModelRecord {
    nodes: Vec<NodeRecord>,
}

impl ModelRecord {
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        Self { nodes }
    }

    /// Nodes in their recorded order.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NodeRecord> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id_ == id)
    }

    /// Returns the same record with nodes ordered by id (stable).
    pub fn sorted_by_id(mut self) -> Self {
        self.nodes.sort_by(|a, b| a.id_.cmp(&b.id_));
        self
    }

    // ── Totals ─────────────────────────────────────────────────
    //
    // Sums saturate at `u64::MAX`.

    /// Sum of the known FLOP estimates.
    pub fn total_flops(&self) -> u64 {
        saturating_sum(self.nodes.iter().filter_map(|n| n.flops.known()))
    }

    /// Number of nodes whose FLOPs could not be estimated.
    pub fn unknown_flops_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.flops.is_known()).count()
    }

    pub fn total_params(&self) -> u64 {
        saturating_sum(self.nodes.iter().map(|n| n.params))
    }

    pub fn total_prunable_params(&self) -> u64 {
        saturating_sum(self.nodes.iter().map(|n| n.prunable_params))
    }

    pub fn total_prunable_params_zeroed(&self) -> u64 {
        saturating_sum(self.nodes.iter().map(|n| n.prunable_params_zeroed))
    }

    /// Fraction of all prunable parameters that are already zero.
    pub fn sparsity(&self) -> f64 {
        let prunable = self.total_prunable_params();
        if prunable == 0 {
            0.0
        } else {
            self.total_prunable_params_zeroed() as f64 / prunable as f64
        }
    }

    /// Totals grouped by operator type.
    pub fn op_breakdown(&self) -> BTreeMap<String, OpTotals> {
        let mut breakdown: BTreeMap<String, OpTotals> = BTreeMap::new();
        for node in &self.nodes {
            breakdown.entry(node.op_type.clone()).or_default().add(node);
        }
        breakdown
    }

    /// Returns a summary string describing the totals.
    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} flops ({} unknown), {} params, {} prunable ({:.2}% zero)",
            self.len(),
            self.total_flops(),
            self.unknown_flops_nodes(),
            self.total_params(),
            self.total_prunable_params(),
            self.sparsity() * 100.0,
        )
    }

    // ── Mapping ────────────────────────────────────────────────

    /// Serializes to `{"nodes": [...]}`, preserving node order.
    pub fn to_mapping(&self) -> Value {
        let nodes = self.nodes.iter().map(NodeRecord::to_mapping).collect();
        let mut obj = Map::new();
        obj.insert("nodes".to_string(), Value::Array(nodes));
        Value::Object(obj)
    }

    /// Reconstructs a record without recomputing any value.
    pub fn from_mapping(value: &Value) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or(SchemaError::MissingNodes)?;
        if let Some(key) = obj.keys().find(|k| k.as_str() != "nodes") {
            return Err(SchemaError::UnknownTopLevelKey(key.clone()));
        }
        let nodes = obj
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or(SchemaError::MissingNodes)?;
        let nodes = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| NodeRecord::from_mapping_at(node, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nodes })
    }

    /// Serializes to the report text: pretty JSON, sorted keys, newline.
    pub fn to_json_string(&self) -> String {
        // Value maps are ordered by key, so the output is stable.
        let mut text = format!("{:#}", self.to_mapping());
        text.push('\n');
        text
    }

    /// Writes the report to `path`.
    pub fn persist(&self, path: &Path) -> Result<(), AnalyzerError> {
        std::fs::write(path, self.to_json_string()).map_err(|source| AnalyzerError::ReportIo {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("wrote report '{}' ({} nodes)", path.display(), self.len());
        Ok(())
    }

    /// Reads a report written by [`persist`](Self::persist).
    pub fn load(path: &Path) -> Result<Self, AnalyzerError> {
        let text = std::fs::read_to_string(path).map_err(|source| AnalyzerError::ReportIo {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| AnalyzerError::ReportJson {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_mapping(&value)?)
    }
}

impl PartialEq for ModelRecord {
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        let mut unmatched: HashMap<&str, Vec<&NodeRecord>> = HashMap::new();
        for node in &other.nodes {
            unmatched.entry(node.id_.as_str()).or_default().push(node);
        }
        self.nodes.iter().all(|node| {
            let Some(candidates) = unmatched.get_mut(node.id_.as_str()) else {
                return false;
            };
            match candidates.iter().position(|c| *c == node) {
                Some(i) => {
                    candidates.swap_remove(i);
                    true
                }
                None => false,
            }
        })
    }
}
