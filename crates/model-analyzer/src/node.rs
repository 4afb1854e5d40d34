// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-node analysis.
//!
//! For one node the analyzer:
//! 1. Resolves every input and output shape through the graph accessor.
//! 2. Asks the operator's cost rule which inputs hold the weight and bias
//!    (only initializers qualify).
//! 3. Runs the rule and counts zero-valued weight elements.
//! 4. Clamps the counts so `zeroed <= prunable_params <= params` holds.
//!
//! Missing shapes and unregistered operators never fail the node; they are
//! reported as [`AnalysisWarning`]s and degrade the affected fields.

use crate::cost::{CostInputs, CostModel, OpCost, ParamSlots};
use crate::{AnalysisWarning, NodeRecord};
use model_ir::{graph::Validated, GraphNode, ModelGraph};
use tensor_core::Shape;

/// Analyzes single nodes of a validated graph.
pub struct NodeAnalyzer<'a> {
    graph: &'a ModelGraph<Validated>,
    costs: &'a CostModel,
}

impl<'a> NodeAnalyzer<'a> {
    pub fn new(graph: &'a ModelGraph<Validated>, costs: &'a CostModel) -> Self {
        Self { graph, costs }
    }

    /// Analyzes the node at position `index` in definition order.
    pub fn analyze(&self, node: &GraphNode, index: usize) -> NodeRecord {
        self.analyze_with_warnings(node, index).0
    }

    /// Same as [`analyze`](Self::analyze), also returning what degraded.
    pub fn analyze_with_warnings(
        &self,
        node: &GraphNode,
        index: usize,
    ) -> (NodeRecord, Vec<AnalysisWarning>) {
        let id = node_id(node, index);
        let mut warnings = Vec::new();

        let input_shapes = self.resolve(&id, &node.inputs, &mut warnings);
        let output_shapes = self.resolve(&id, &node.outputs, &mut warnings);

        let rule = self.costs.rule(&node.op_type);
        let slots = match rule {
            Some(rule) => {
                let initializers: Vec<bool> = node
                    .inputs
                    .iter()
                    .map(|name| !name.is_empty() && self.graph.is_initializer(name))
                    .collect();
                rule.parameter_slots(&initializers)
            }
            None => ParamSlots::NONE,
        };

        let weight_name = slots.weight.and_then(|i| node.input(i));
        let bias_name = slots.bias.and_then(|i| node.input(i));
        let weight = weight_name.and_then(|name| self.graph.initializer_of(name));
        let bias = bias_name.and_then(|name| self.graph.initializer_of(name));

        let cost = match rule {
            Some(rule) => rule.estimate(&CostInputs {
                input_shapes: &input_shapes,
                output_shapes: &output_shapes,
                weight: slots.weight.zip(weight.map(|w| &w.shape)),
                bias: bias.map(|b| &b.shape),
                attributes: &node.attributes,
            }),
            None => {
                tracing::warn!("node '{id}': no cost rule for operator '{}'", node.op_type);
                warnings.push(AnalysisWarning::UnknownOperator {
                    node: id.clone(),
                    op_type: node.op_type.clone(),
                });
                OpCost::UNKNOWN
            }
        };

        let zeroed = match weight {
            Some(w) if cost.prunable => w.zeroed_elements().unwrap_or(0),
            _ => 0,
        };
        let prunable_params = cost.prunable_params.min(cost.params);
        let prunable_params_zeroed = zeroed.min(prunable_params);

        tracing::debug!(
            "node '{id}' ({}): flops={}, params={}, prunable={}/{}",
            node.op_type,
            cost.flops,
            cost.params,
            prunable_params_zeroed,
            prunable_params,
        );

        let record = NodeRecord {
            id_: id,
            op_type: node.op_type.clone(),
            input_names: node.inputs.clone(),
            output_names: node.outputs.clone(),
            input_shapes,
            output_shapes,
            flops: cost.flops,
            params: cost.params,
            prunable: cost.prunable,
            prunable_params,
            prunable_params_zeroed,
            weight_name: weight.map(|w| w.name.clone()),
            weight_shape: weight.map(|w| w.shape.clone()),
            bias_name: bias.map(|b| b.name.clone()),
            bias_shape: bias.map(|b| b.shape.clone()),
            attributes: node.attributes.clone(),
        };
        (record, warnings)
    }

    /// Looks up each tensor's shape; empty names (omitted optional inputs)
    /// resolve to `None` without a warning.
    fn resolve(
        &self,
        id: &str,
        names: &[String],
        warnings: &mut Vec<AnalysisWarning>,
    ) -> Vec<Option<Shape>> {
        names
            .iter()
            .map(|name| {
                if name.is_empty() {
                    return None;
                }
                let shape = self.graph.shape_of(name).cloned();
                if shape.is_none() {
                    tracing::warn!("node '{id}': shape of tensor '{name}' is unknown");
                    warnings.push(AnalysisWarning::UnresolvedShape {
                        node: id.to_string(),
                        tensor: name.clone(),
                    });
                }
                shape
            })
            .collect()
    }
}

/// First non-empty output name, or a positional id.
pub fn node_id(node: &GraphNode, index: usize) -> String {
    match node.primary_output() {
        Some(output) => output.to_string(),
        None => format!("node.{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Estimate;
    use model_ir::proto::tensor_shape_proto::Dimension;
    use model_ir::proto::{
        attribute_type, AttributeProto, GraphProto, ModelProto, NodeProto, TensorProto,
        ValueInfoProto,
    };
    use model_ir::{GraphLoader, LoadOptions};

    fn dims(d: &[i64]) -> Vec<Dimension> {
        d.iter().map(|&v| Dimension::fixed(v)).collect()
    }

    fn conv_graph(weight_values: Vec<f32>) -> ModelGraph<Validated> {
        let model = ModelProto {
            graph: Some(GraphProto {
                name: "conv".into(),
                node: vec![NodeProto {
                    input: vec!["x".into(), "w".into(), "b".into()],
                    output: vec!["y".into()],
                    name: "conv1".into(),
                    op_type: "Conv".into(),
                    attribute: vec![AttributeProto {
                        name: "kernel_shape".into(),
                        ints: vec![3, 3],
                        r#type: attribute_type::INTS,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                initializer: vec![
                    TensorProto {
                        name: "w".into(),
                        dims: vec![16, 3, 3, 3],
                        data_type: 1,
                        float_data: weight_values,
                        ..Default::default()
                    },
                    TensorProto {
                        name: "b".into(),
                        dims: vec![16],
                        data_type: 1,
                        float_data: vec![0.0; 16],
                        ..Default::default()
                    },
                ],
                input: vec![ValueInfoProto::tensor("x", 1, dims(&[16, 3, 4, 4]))],
                output: vec![ValueInfoProto::tensor("y", 1, dims(&[16, 16, 2, 2]))],
                ..Default::default()
            }),
            ..Default::default()
        };
        GraphLoader::from_proto(model, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_conv_node() {
        let mut values = vec![1.0f32; 432];
        for v in values.iter_mut().take(100) {
            *v = 0.0;
        }
        let graph = conv_graph(values);
        let costs = CostModel::standard();
        let (record, warnings) =
            NodeAnalyzer::new(&graph, &costs).analyze_with_warnings(&graph.nodes()[0], 0);

        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(record.id_, "y");
        assert_eq!(record.flops, Estimate::Known(27712));
        assert_eq!(record.params, 448);
        assert_eq!(record.prunable_params, 432);
        assert_eq!(record.prunable_params_zeroed, 100);
        assert_eq!(record.weight_name.as_deref(), Some("w"));
        assert_eq!(record.bias_name.as_deref(), Some("b"));
        assert_eq!(record.bias_shape, Some(Shape::vector(16)));
        assert_eq!(record.input_shapes.len(), 3);
        assert!(record.input_shapes.iter().all(Option::is_some));
        assert!(record.attributes.contains_key("kernel_shape"));
    }

    #[test]
    fn test_weight_values_absent() {
        let graph = conv_graph(Vec::new());
        let costs = CostModel::standard();
        let record = NodeAnalyzer::new(&graph, &costs).analyze(&graph.nodes()[0], 0);
        assert_eq!(record.prunable_params_zeroed, 0);
        assert_eq!(record.prunable_params, 432);
    }

    #[test]
    fn test_unknown_operator_degrades() {
        let graph = conv_graph(Vec::new());
        let costs = CostModel::empty();
        let (record, warnings) =
            NodeAnalyzer::new(&graph, &costs).analyze_with_warnings(&graph.nodes()[0], 0);
        assert_eq!(record.flops, Estimate::Unknown);
        assert_eq!(record.params, 0);
        assert!(!record.prunable);
        assert_eq!(record.weight_name, None);
        assert_eq!(
            warnings,
            vec![AnalysisWarning::UnknownOperator {
                node: "y".into(),
                op_type: "Conv".into()
            }]
        );
    }

    #[test]
    fn test_positional_id() {
        let node = GraphNode::from_proto(&NodeProto {
            output: vec![String::new()],
            op_type: "Identity".into(),
            ..Default::default()
        });
        assert_eq!(node_id(&node, 7), "node.7");
    }
}
