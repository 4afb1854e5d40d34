// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: the loaded computation graph and its read-only accessor.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>     : decoded, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  : structure verified, ready for analysis.
//! ```
//!
//! Only a validated graph exposes the accessor operations
//! ([`nodes`](ModelGraph::nodes), [`shape_of`](ModelGraph::shape_of),
//! [`initializer_of`](ModelGraph::initializer_of)), so the analyzer can
//! never observe a graph with missing top-level structure.

use crate::proto::ModelProto;
use crate::shapes::ShapeTable;
use crate::{GraphLoadError, GraphNode, Initializer};
use std::collections::HashMap;
use std::fmt;
use tensor_core::Shape;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been decoded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and is ready for analysis.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

/// Options applied while building a graph from its protobuf form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Value substituted for symbolic dimensions (e.g., a `batch` axis).
    /// With `None`, any symbolic dimension makes the whole shape unknown.
    pub symbolic_dim: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            symbolic_dim: Some(1),
        }
    }
}

// ── ModelGraph ─────────────────────────────────────────────────────

/// A loaded computation graph.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Graph name (falls back to the producer name when empty).
    pub name: String,
    nodes: Vec<GraphNode>,
    initializers: HashMap<String, Initializer>,
    shapes: ShapeTable,
    inputs: Vec<String>,
    outputs: Vec<String>,
    has_graph: bool,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Builds a graph from a decoded model, consuming it.
    ///
    /// Initializer values are moved, not copied. Shape resolution happens
    /// here, once; lookups afterwards are plain map reads.
    pub fn from_proto(model: ModelProto, options: &LoadOptions) -> Result<Self, GraphLoadError> {
        let Some(mut graph) = model.graph else {
            return Ok(Self::without_graph(model.producer_name));
        };

        let nodes: Vec<GraphNode> = graph.node.iter().map(GraphNode::from_proto).collect();

        let mut initializers = HashMap::with_capacity(graph.initializer.len());
        for proto in std::mem::take(&mut graph.initializer) {
            let init = Initializer::from_proto(proto)?;
            if initializers.contains_key(&init.name) {
                tracing::warn!("duplicate initializer '{}', keeping the first", init.name);
                continue;
            }
            initializers.insert(init.name.clone(), init);
        }

        let shapes = ShapeTable::build(&graph, &nodes, &initializers, options.symbolic_dim);

        let name = if graph.name.is_empty() {
            model.producer_name
        } else {
            graph.name.clone()
        };

        Ok(Self {
            name,
            nodes,
            initializers,
            shapes,
            inputs: graph.input.iter().map(|v| v.name.clone()).collect(),
            outputs: graph.output.iter().map(|v| v.name.clone()).collect(),
            has_graph: true,
            _state: std::marker::PhantomData,
        })
    }

    fn without_graph(name: String) -> Self {
        Self {
            name,
            nodes: Vec::new(),
            initializers: HashMap::new(),
            shapes: ShapeTable::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            has_graph: false,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The model contains a graph.
    /// - The graph has at least one node.
    /// - Every node declares an operator type.
    pub fn validate(self) -> Result<ModelGraph<Validated>, GraphLoadError> {
        if !self.has_graph {
            return Err(GraphLoadError::MissingGraph);
        }
        if self.nodes.is_empty() {
            return Err(GraphLoadError::EmptyGraph(self.name));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if node.op_type.is_empty() {
                return Err(GraphLoadError::InvalidNode {
                    index,
                    name: node.name.clone(),
                    detail: "missing operator type".into(),
                });
            }
        }

        tracing::debug!(
            "graph '{}' validated: {} nodes, {} initializers, {} known shapes",
            self.name,
            self.nodes.len(),
            self.initializers.len(),
            self.shapes.len(),
        );

        Ok(ModelGraph {
            name: self.name,
            nodes: self.nodes,
            initializers: self.initializers,
            shapes: self.shapes,
            inputs: self.inputs,
            outputs: self.outputs,
            has_graph: true,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the nodes in definition order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Returns the total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the shape of a tensor, or `None` if it cannot be determined.
    pub fn shape_of(&self, tensor: &str) -> Option<&Shape> {
        self.shapes.get(tensor)
    }

    /// Returns the initializer with the given name.
    pub fn initializer_of(&self, tensor: &str) -> Option<&Initializer> {
        self.initializers.get(tensor)
    }

    /// Returns `true` if the tensor is an initializer.
    pub fn is_initializer(&self, tensor: &str) -> bool {
        self.initializers.contains_key(tensor)
    }

    /// Names of the declared graph inputs that are not initializers.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(String::as_str)
            .filter(|name| !self.initializers.contains_key(*name))
    }

    /// Names of the declared graph outputs.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    /// Total number of elements across all initializers, saturating at
    /// `u64::MAX`.
    pub fn total_initializer_elements(&self) -> u64 {
        self.initializers
            .values()
            .map(|init| init.num_elements().unwrap_or(u64::MAX))
            .fold(0, u64::saturating_add)
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        format!(
            "Graph '{}': {} nodes, {} initializers ({} elements)",
            self.name,
            self.num_nodes(),
            self.initializers.len(),
            self.total_initializer_elements(),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::tensor_shape_proto::Dimension;
    use crate::proto::{GraphProto, NodeProto, TensorProto, ValueInfoProto};

    fn model(nodes: Vec<NodeProto>) -> ModelProto {
        ModelProto {
            producer_name: "test".into(),
            graph: Some(GraphProto {
                name: "g".into(),
                node: nodes,
                initializer: vec![TensorProto {
                    name: "w".into(),
                    dims: vec![4, 8],
                    data_type: 1,
                    ..Default::default()
                }],
                input: vec![
                    ValueInfoProto::tensor("x", 1, vec![Dimension::symbolic("N"), Dimension::fixed(8)]),
                    ValueInfoProto::tensor("w", 1, vec![Dimension::fixed(4), Dimension::fixed(8)]),
                ],
                output: vec![ValueInfoProto::tensor("y", 1, vec![Dimension::fixed(1), Dimension::fixed(4)])],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn matmul() -> NodeProto {
        NodeProto {
            input: vec!["x".into(), "w".into()],
            output: vec!["y".into()],
            name: "fc".into(),
            op_type: "Gemm".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        let graph = ModelGraph::from_proto(model(vec![matmul()]), &LoadOptions::default())
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(graph.num_nodes(), 1);
        assert_eq!(graph.name, "g");
        assert_eq!(graph.shape_of("x"), Some(&Shape::matrix(1, 8)));
        assert_eq!(graph.shape_of("w"), Some(&Shape::matrix(4, 8)));
        assert_eq!(graph.shape_of("missing"), None);
        assert!(graph.is_initializer("w"));
        assert_eq!(graph.input_names().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(graph.output_names().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_validate_empty() {
        let graph = ModelGraph::from_proto(model(vec![]), &LoadOptions::default()).unwrap();
        assert!(matches!(graph.validate(), Err(GraphLoadError::EmptyGraph(_))));
    }

    #[test]
    fn test_validate_missing_graph() {
        let graph = ModelGraph::from_proto(ModelProto::default(), &LoadOptions::default()).unwrap();
        assert!(matches!(graph.validate(), Err(GraphLoadError::MissingGraph)));
    }

    #[test]
    fn test_validate_missing_op_type() {
        let mut bad = matmul();
        bad.op_type = String::new();
        let graph = ModelGraph::from_proto(model(vec![matmul(), bad]), &LoadOptions::default()).unwrap();
        assert!(matches!(
            graph.validate(),
            Err(GraphLoadError::InvalidNode { index: 1, .. })
        ));
    }

    #[test]
    fn test_strict_symbolic_dims() {
        let options = LoadOptions { symbolic_dim: None };
        let graph = ModelGraph::from_proto(model(vec![matmul()]), &options)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(graph.shape_of("x"), None);
    }

    #[test]
    fn test_summary_and_display() {
        let graph = ModelGraph::from_proto(model(vec![matmul()]), &LoadOptions::default())
            .unwrap()
            .validate()
            .unwrap();
        assert!(graph.summary().contains("1 nodes"));
        assert_eq!(graph.total_initializer_elements(), 32);
        assert!(format!("{graph}").contains("Gemm"));
    }
}
