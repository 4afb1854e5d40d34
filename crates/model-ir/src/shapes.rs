// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape table with fallback inference.
//!
//! The table is filled once, when the graph is built, in this order (first
//! hit wins):
//!
//! ```text
//! value_info  →  graph outputs  →  graph inputs  →  initializer dims
//!      →  inference from the producing node (definition order)
//! ```
//!
//! Inference only covers cheap, unambiguous cases: `Constant` values,
//! explicit `shape` / `output_shape` attributes, shape-preserving unary
//! operators, broadcasting element-wise operators, global pooling and
//! `Flatten`. Anything else stays unknown.

use crate::proto::tensor_shape_proto::{dimension, Dimension};
use crate::proto::GraphProto;
use crate::{GraphNode, Initializer};
use std::collections::HashMap;
use tensor_core::Shape;

/// Operators whose first output has the shape of their first input.
const SHAPE_PRESERVING: &[&str] = &[
    "Abs", "BatchNormalization", "Cast", "Ceil", "Clip", "Dropout", "Elu", "Erf", "Exp",
    "Floor", "Gelu", "HardSigmoid", "HardSwish", "Identity", "InstanceNormalization",
    "LayerNormalization", "LeakyRelu", "Log", "LogSoftmax", "LRN", "Mish", "Neg", "Not",
    "PRelu", "QuantizeLinear", "DequantizeLinear", "Reciprocal", "Relu", "Round", "Selu",
    "Sigmoid", "Sign", "Softmax", "Softplus", "Softsign", "Sqrt", "Tanh", "ThresholdedRelu",
];

/// Operators whose output is the broadcast of all their inputs.
const BROADCASTING: &[&str] = &[
    "Add", "And", "Div", "Equal", "Greater", "GreaterOrEqual", "Less", "LessOrEqual", "Max",
    "Mean", "Min", "Mod", "Mul", "Or", "Pow", "Sub", "Sum", "Where", "Xor",
];

/// Resolved shapes keyed by tensor name.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeTable {
    shapes: HashMap<String, Shape>,
}

impl ShapeTable {
    pub(crate) fn build(
        graph: &GraphProto,
        nodes: &[GraphNode],
        initializers: &HashMap<String, Initializer>,
        symbolic_dim: Option<usize>,
    ) -> Self {
        let mut table = Self::default();

        let declared = graph
            .value_info
            .iter()
            .chain(&graph.output)
            .chain(&graph.input);
        for info in declared {
            if info.name.is_empty() || table.shapes.contains_key(&info.name) {
                continue;
            }
            if let Some(shape) = info.dims().and_then(|d| declared_shape(d, symbolic_dim)) {
                table.shapes.insert(info.name.clone(), shape);
            }
        }

        for (name, init) in initializers {
            table
                .shapes
                .entry(name.clone())
                .or_insert_with(|| init.shape.clone());
        }

        let mut inferred = 0usize;
        for node in nodes {
            let Some(output) = node.outputs.first().filter(|o| !o.is_empty()) else {
                continue;
            };
            if table.shapes.contains_key(output) {
                continue;
            }
            if let Some(shape) = table.infer(node) {
                table.shapes.insert(output.clone(), shape);
                inferred += 1;
            }
        }
        if inferred > 0 {
            tracing::debug!("inferred {inferred} tensor shapes from producing nodes");
        }

        table
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.shapes.len()
    }

    fn input_shape(&self, node: &GraphNode, i: usize) -> Option<&Shape> {
        node.input(i).and_then(|name| self.shapes.get(name))
    }

    fn infer(&self, node: &GraphNode) -> Option<Shape> {
        let op = node.op_type.as_str();

        if op == "Constant" {
            return node.constant_dims.as_deref().and_then(Shape::from_i64);
        }
        if let Some(dims) = node.ints_attr("shape") {
            return Shape::from_i64(dims);
        }
        if op != "ConvTranspose" {
            if let Some(dims) = node.ints_attr("output_shape") {
                return Shape::from_i64(dims);
            }
        }

        if SHAPE_PRESERVING.contains(&op) {
            return self.input_shape(node, 0).cloned();
        }

        if BROADCASTING.contains(&op) {
            let mut result: Option<Shape> = None;
            for i in 0..node.inputs.len() {
                let shape = self.input_shape(node, i)?;
                result = Some(match result {
                    None => shape.clone(),
                    Some(acc) => acc.broadcast(shape)?,
                });
            }
            return result;
        }

        match op {
            "GlobalAveragePool" | "GlobalMaxPool" | "GlobalLpPool" => {
                let input = self.input_shape(node, 0)?;
                let mut dims = input.dims().to_vec();
                for d in dims.iter_mut().skip(2) {
                    *d = 1;
                }
                Some(Shape::new(dims))
            }
            "Flatten" => {
                let input = self.input_shape(node, 0)?;
                let rank = input.rank() as i64;
                let mut axis = node.int_attr("axis", 1);
                if axis < 0 {
                    axis += rank;
                }
                if !(0..=rank).contains(&axis) {
                    return None;
                }
                let axis = axis as usize;
                let rows = usize::try_from(input.product_of(0..axis)?).ok()?;
                let cols = usize::try_from(input.product_of(axis..input.rank())?).ok()?;
                Some(Shape::matrix(rows, cols))
            }
            _ => None,
        }
    }
}

/// Converts declared dimensions; symbolic dimensions resolve to
/// `symbolic_dim`, or make the whole shape unknown when it is `None`.
fn declared_shape(dims: &[Dimension], symbolic_dim: Option<usize>) -> Option<Shape> {
    dims.iter()
        .map(|d| match &d.value {
            Some(dimension::Value::DimValue(v)) if *v >= 0 => Some(*v as usize),
            _ => symbolic_dim,
        })
        .collect::<Option<Vec<_>>>()
        .map(Shape::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{attribute_type, AttributeProto, NodeProto, ValueInfoProto};

    fn node(op: &str, inputs: &[&str], output: &str, attrs: Vec<AttributeProto>) -> GraphNode {
        GraphNode::from_proto(&NodeProto {
            input: inputs.iter().map(|s| s.to_string()).collect(),
            output: vec![output.to_string()],
            op_type: op.into(),
            attribute: attrs,
            ..Default::default()
        })
    }

    fn graph_with_input(dims: Vec<Dimension>) -> GraphProto {
        GraphProto {
            input: vec![ValueInfoProto::tensor("x", 1, dims)],
            ..Default::default()
        }
    }

    #[test]
    fn test_declared_symbolic_dims() {
        let dims = vec![Dimension::symbolic("N"), Dimension::fixed(3)];
        assert_eq!(declared_shape(&dims, Some(1)), Some(Shape::matrix(1, 3)));
        assert_eq!(declared_shape(&dims, None), None);
    }

    #[test]
    fn test_value_info_takes_precedence() {
        let mut graph = graph_with_input(vec![Dimension::fixed(1), Dimension::fixed(8)]);
        graph.value_info.push(ValueInfoProto::tensor(
            "x",
            1,
            vec![Dimension::fixed(2), Dimension::fixed(8)],
        ));
        let table = ShapeTable::build(&graph, &[], &HashMap::new(), Some(1));
        assert_eq!(table.get("x"), Some(&Shape::matrix(2, 8)));
    }

    #[test]
    fn test_propagation_through_unary_and_broadcast() {
        let graph = graph_with_input(vec![Dimension::symbolic("N"), Dimension::fixed(16)]);
        let nodes = vec![
            node("Relu", &["x"], "r", vec![]),
            node("Add", &["r", "x"], "a", vec![]),
            node("Unknown", &["a"], "u", vec![]),
            node("Sigmoid", &["u"], "s", vec![]),
        ];
        let table = ShapeTable::build(&graph, &nodes, &HashMap::new(), Some(1));
        assert_eq!(table.get("r"), Some(&Shape::matrix(1, 16)));
        assert_eq!(table.get("a"), Some(&Shape::matrix(1, 16)));
        assert_eq!(table.get("u"), None);
        assert_eq!(table.get("s"), None);
    }

    #[test]
    fn test_global_pool_and_flatten() {
        let graph = graph_with_input(vec![
            Dimension::fixed(1),
            Dimension::fixed(64),
            Dimension::fixed(7),
            Dimension::fixed(7),
        ]);
        let nodes = vec![
            node("GlobalAveragePool", &["x"], "p", vec![]),
            node("Flatten", &["p"], "f", vec![]),
        ];
        let table = ShapeTable::build(&graph, &nodes, &HashMap::new(), Some(1));
        assert_eq!(table.get("p"), Some(&Shape::new(vec![1, 64, 1, 1])));
        assert_eq!(table.get("f"), Some(&Shape::matrix(1, 64)));
    }

    #[test]
    fn test_shape_attribute() {
        let attr = AttributeProto {
            name: "shape".into(),
            ints: vec![4, 4],
            r#type: attribute_type::INTS,
            ..Default::default()
        };
        let nodes = vec![node("RandomNormal", &[], "n", vec![attr])];
        let table = ShapeTable::build(&GraphProto::default(), &nodes, &HashMap::new(), Some(1));
        assert_eq!(table.get("n"), Some(&Shape::matrix(4, 4)));
        assert_eq!(table.len(), 1);
    }
}
