// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator nodes and their attributes.
//!
//! A [`GraphNode`] is the read-only view of one `NodeProto`: operator type,
//! ordered input/output tensor names and a sorted attribute map. Attribute
//! values are converted into [`AttributeValue`], which serializes as a plain
//! JSON value so it can be carried verbatim into analysis reports.

use crate::proto::{attribute_type, AttributeProto, NodeProto, TensorProto};
use std::collections::BTreeMap;
use std::fmt;

/// Summary of a tensor-valued attribute. Values are not copied.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TensorSummary {
    pub dims: Vec<i64>,
    pub data_type: i32,
}

/// A single operator attribute value.
///
/// Serialized untagged: `3`, `0.5`, `"NOTSET"`, `[1, 1]`, ... Empty lists
/// always become [`AttributeValue::Ints`] so that a JSON round trip yields
/// the same variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
    Tensor(TensorSummary),
}

impl AttributeValue {
    /// Converts an `AttributeProto`, or returns `None` for attribute kinds
    /// that are not carried (sub-graphs, tensor lists).
    pub fn from_proto(attr: &AttributeProto) -> Option<Self> {
        let kind = if attr.r#type == attribute_type::UNDEFINED {
            infer_attribute_type(attr)
        } else {
            attr.r#type
        };

        let value = match kind {
            attribute_type::INT => Self::Int(attr.i),
            attribute_type::FLOAT => Self::Float(f64::from(attr.f)),
            attribute_type::STRING => Self::String(String::from_utf8_lossy(&attr.s).into_owned()),
            attribute_type::INTS => Self::Ints(attr.ints.clone()),
            attribute_type::FLOATS => Self::Floats(attr.floats.iter().map(|&f| f64::from(f)).collect()),
            attribute_type::STRINGS => Self::Strings(
                attr.strings
                    .iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect(),
            ),
            attribute_type::TENSOR => Self::Tensor(TensorSummary::from(attr.t.as_ref()?)),
            _ => return None,
        };
        Some(value.normalized())
    }

    /// Maps empty lists of any element type to `Ints([])`. Non-finite floats
    /// have no JSON form and are carried as their string spelling.
    fn normalized(self) -> Self {
        match self {
            Self::Floats(v) if v.is_empty() => Self::Ints(Vec::new()),
            Self::Strings(v) if v.is_empty() => Self::Ints(Vec::new()),
            Self::Float(x) if !x.is_finite() => Self::String(x.to_string()),
            Self::Floats(v) if v.iter().any(|x| !x.is_finite()) => {
                Self::Strings(v.iter().map(f64::to_string).collect())
            }
            other => other,
        }
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as an integer list, if it is one.
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Ints(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Ints(v) => write!(f, "{v:?}"),
            Self::Floats(v) => write!(f, "{v:?}"),
            Self::Strings(v) => write!(f, "{v:?}"),
            Self::Tensor(t) => write!(f, "tensor{:?}", t.dims),
        }
    }
}

impl From<&TensorProto> for TensorSummary {
    fn from(t: &TensorProto) -> Self {
        Self {
            dims: t.dims.clone(),
            data_type: t.data_type,
        }
    }
}

/// Older exporters leave `type` unset; guess it from the populated field.
fn infer_attribute_type(attr: &AttributeProto) -> i32 {
    if !attr.ints.is_empty() {
        attribute_type::INTS
    } else if !attr.floats.is_empty() {
        attribute_type::FLOATS
    } else if !attr.strings.is_empty() {
        attribute_type::STRINGS
    } else if attr.t.is_some() {
        attribute_type::TENSOR
    } else if !attr.s.is_empty() {
        attribute_type::STRING
    } else if attr.f != 0.0 {
        attribute_type::FLOAT
    } else {
        attribute_type::INT
    }
}

/// A single operator node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Node name (may be empty).
    pub name: String,
    /// Operator type (e.g., `"Conv"`, `"Gemm"`).
    pub op_type: String,
    /// Operator domain (empty for the default ONNX domain).
    pub domain: String,
    /// Input tensor names in argument order. Omitted optional inputs are `""`.
    pub inputs: Vec<String>,
    /// Output tensor names in result order.
    pub outputs: Vec<String>,
    /// Declared attributes, sorted by name.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Value of a tensor-valued `value` attribute (used by `Constant`).
    pub(crate) constant_dims: Option<Vec<i64>>,
}

impl GraphNode {
    /// Converts a `NodeProto`. Attributes that cannot be carried are dropped
    /// with a debug log.
    pub fn from_proto(proto: &NodeProto) -> Self {
        let mut attributes = BTreeMap::new();
        let mut constant_dims = None;
        for attr in &proto.attribute {
            if attr.name == "value" {
                if let Some(t) = &attr.t {
                    constant_dims = Some(t.dims.clone());
                }
            }
            match AttributeValue::from_proto(attr) {
                Some(value) => {
                    attributes.insert(attr.name.clone(), value);
                }
                None => tracing::debug!(
                    "node '{}' ({}): skipping attribute '{}' of type {}",
                    proto.name,
                    proto.op_type,
                    attr.name,
                    attr.r#type,
                ),
            }
        }

        Self {
            name: proto.name.clone(),
            op_type: proto.op_type.clone(),
            domain: proto.domain.clone(),
            inputs: proto.input.clone(),
            outputs: proto.output.clone(),
            attributes,
            constant_dims,
        }
    }

    /// Returns an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Returns an integer attribute, or `default` if absent or mistyped.
    pub fn int_attr(&self, name: &str, default: i64) -> i64 {
        self.attr(name).and_then(AttributeValue::as_int).unwrap_or(default)
    }

    /// Returns an integer-list attribute.
    pub fn ints_attr(&self, name: &str) -> Option<&[i64]> {
        self.attr(name).and_then(AttributeValue::as_ints)
    }

    /// Returns the `i`-th input name, treating `""` as absent.
    pub fn input(&self, i: usize) -> Option<&str> {
        self.inputs.get(i).map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Returns the first non-empty output name.
    pub fn primary_output(&self) -> Option<&str> {
        self.outputs.iter().map(String::as_str).find(|s| !s.is_empty())
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} inputs, {} outputs, {} attributes",
            self.primary_output().unwrap_or(&self.name),
            self.op_type,
            self.inputs.len(),
            self.outputs.len(),
            self.attributes.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints_attr(name: &str, ints: Vec<i64>) -> AttributeProto {
        AttributeProto {
            name: name.into(),
            ints,
            r#type: attribute_type::INTS,
            ..Default::default()
        }
    }

    #[test]
    fn test_attribute_conversion() {
        let int = AttributeProto {
            name: "group".into(),
            i: 2,
            r#type: attribute_type::INT,
            ..Default::default()
        };
        assert_eq!(AttributeValue::from_proto(&int), Some(AttributeValue::Int(2)));

        let string = AttributeProto {
            name: "auto_pad".into(),
            s: b"SAME_UPPER".to_vec(),
            r#type: attribute_type::STRING,
            ..Default::default()
        };
        assert_eq!(
            AttributeValue::from_proto(&string),
            Some(AttributeValue::String("SAME_UPPER".into()))
        );

        let alpha = AttributeProto {
            name: "alpha".into(),
            f: 0.5,
            r#type: attribute_type::FLOAT,
            ..Default::default()
        };
        assert_eq!(AttributeValue::from_proto(&alpha), Some(AttributeValue::Float(0.5)));
    }

    #[test]
    fn test_untyped_attribute_inference() {
        let attr = AttributeProto {
            name: "pads".into(),
            ints: vec![1, 1, 1, 1],
            ..Default::default()
        };
        assert_eq!(
            AttributeValue::from_proto(&attr),
            Some(AttributeValue::Ints(vec![1, 1, 1, 1]))
        );
    }

    #[test]
    fn test_empty_lists_normalize_to_ints() {
        let attr = AttributeProto {
            name: "scales".into(),
            r#type: attribute_type::FLOATS,
            ..Default::default()
        };
        assert_eq!(AttributeValue::from_proto(&attr), Some(AttributeValue::Ints(vec![])));
    }

    #[test]
    fn test_non_finite_floats_become_strings() {
        let attr = AttributeProto {
            name: "max".into(),
            f: f32::INFINITY,
            r#type: attribute_type::FLOAT,
            ..Default::default()
        };
        assert_eq!(
            AttributeValue::from_proto(&attr),
            Some(AttributeValue::String("inf".into()))
        );
    }

    #[test]
    fn test_graph_attributes_are_skipped() {
        let attr = AttributeProto {
            name: "then_branch".into(),
            r#type: attribute_type::GRAPH,
            ..Default::default()
        };
        assert_eq!(AttributeValue::from_proto(&attr), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_variants() {
        let values = vec![
            AttributeValue::Int(1),
            AttributeValue::Float(1.0),
            AttributeValue::Float(0.10000000149011612),
            AttributeValue::String("NOTSET".into()),
            AttributeValue::Ints(vec![3, 3]),
            AttributeValue::Floats(vec![0.5, 2.0]),
            AttributeValue::Strings(vec!["a".into()]),
            AttributeValue::Tensor(TensorSummary {
                dims: vec![4],
                data_type: 7,
            }),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: AttributeValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value, "json: {json}");
        }
    }

    #[test]
    fn test_node_from_proto() {
        let proto = NodeProto {
            input: vec!["x".into(), "w".into(), String::new()],
            output: vec!["y".into()],
            name: "conv1".into(),
            op_type: "Conv".into(),
            attribute: vec![ints_attr("kernel_shape", vec![3, 3]), ints_attr("strides", vec![1, 1])],
            ..Default::default()
        };
        let node = GraphNode::from_proto(&proto);
        assert_eq!(node.op_type, "Conv");
        assert_eq!(node.ints_attr("kernel_shape"), Some(&[3, 3][..]));
        assert_eq!(node.int_attr("group", 1), 1);
        assert_eq!(node.input(1), Some("w"));
        assert_eq!(node.input(2), None);
        assert_eq!(node.primary_output(), Some("y"));
        assert!(node.summary().contains("Conv"));
    }

    #[test]
    fn test_constant_value_dims() {
        let proto = NodeProto {
            output: vec!["c".into()],
            op_type: "Constant".into(),
            attribute: vec![AttributeProto {
                name: "value".into(),
                t: Some(TensorProto {
                    dims: vec![2, 5],
                    data_type: 1,
                    ..Default::default()
                }),
                r#type: attribute_type::TENSOR,
                ..Default::default()
            }],
            ..Default::default()
        };
        let node = GraphNode::from_proto(&proto);
        assert_eq!(node.constant_dims, Some(vec![2, 5]));
        assert!(matches!(node.attr("value"), Some(AttributeValue::Tensor(_))));
    }
}
