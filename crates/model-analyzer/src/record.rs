// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The analyzed unit: [`NodeRecord`] and its JSON mapping.
//!
//! A record is an immutable value. It is built either by the node analyzer
//! or field-by-field from a mapping; both paths produce equal records for
//! the same data, since `from_mapping` never recomputes anything.

use crate::{Estimate, SchemaError};
use model_ir::AttributeValue;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tensor_core::Shape;

/// Keys of a serialized node, sorted.
pub const NODE_FIELDS: [&str; 16] = [
    "attributes",
    "bias_name",
    "bias_shape",
    "flops",
    "id",
    "input_names",
    "input_shapes",
    "op_type",
    "output_names",
    "output_shapes",
    "params",
    "prunable",
    "prunable_params",
    "prunable_params_zeroed",
    "weight_name",
    "weight_shape",
];

/// Structural and cost attributes of one graph node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord {
    /// Unique id within a model: the first output name, or `node.{index}`.
    #[serde(rename = "id")]
    pub id_: String,
    pub op_type: String,
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
    /// Resolved input shapes; `None` where the shape is unknown.
    pub input_shapes: Vec<Option<Shape>>,
    pub output_shapes: Vec<Option<Shape>>,
    pub flops: Estimate<u64>,
    /// Weight plus bias elements.
    pub params: u64,
    pub prunable: bool,
    /// Weight elements eligible for pruning (bias excluded).
    pub prunable_params: u64,
    /// Prunable elements whose stored value is exactly zero.
    pub prunable_params_zeroed: u64,
    pub weight_name: Option<String>,
    pub weight_shape: Option<Shape>,
    pub bias_name: Option<String>,
    pub bias_shape: Option<Shape>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl NodeRecord {
    /// Serializes to a JSON object with every field present.
    pub fn to_mapping(&self) -> Value {
        // Keys in sorted order so the output is stable with or without
        // an insertion-ordered map.
        json!({
            "attributes": self.attributes,
            "bias_name": self.bias_name,
            "bias_shape": self.bias_shape,
            "flops": self.flops,
            "id": self.id_,
            "input_names": self.input_names,
            "input_shapes": self.input_shapes,
            "op_type": self.op_type,
            "output_names": self.output_names,
            "output_shapes": self.output_shapes,
            "params": self.params,
            "prunable": self.prunable,
            "prunable_params": self.prunable_params,
            "prunable_params_zeroed": self.prunable_params_zeroed,
            "weight_name": self.weight_name,
            "weight_shape": self.weight_shape,
        })
    }

    /// Reconstructs a record from a JSON object.
    ///
    /// Every key in [`NODE_FIELDS`] must be present (optional values as
    /// `null`) and no other key may appear. Values are taken as given.
    ///
    /// `prunable_params` is the one key that may be left out. It then counts
    /// the weight's elements if the node is prunable, else 0, capped at
    /// `params`.
    pub fn from_mapping(value: &Value) -> Result<Self, SchemaError> {
        Self::from_mapping_at(value, 0)
    }

    pub(crate) fn from_mapping_at(value: &Value, node: usize) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or(SchemaError::NotAnObject { node })?;
        if let Some(key) = obj.keys().find(|k| !NODE_FIELDS.contains(&k.as_str())) {
            return Err(SchemaError::UnknownKey {
                node,
                key: key.clone(),
            });
        }
        let f = Fields { obj, node };
        let params = f.take("params")?;
        let prunable = f.take("prunable")?;
        let weight_shape: Option<Shape> = f.take("weight_shape")?;
        let prunable_params = match f.take_opt("prunable_params")? {
            Some(count) => count,
            None if prunable => weight_shape
                .as_ref()
                .map_or(0, |w| w.num_elements().unwrap_or(u64::MAX))
                .min(params),
            None => 0,
        };

        let record = Self {
            id_: f.take("id")?,
            op_type: f.take("op_type")?,
            input_names: f.take("input_names")?,
            output_names: f.take("output_names")?,
            input_shapes: f.take("input_shapes")?,
            output_shapes: f.take("output_shapes")?,
            flops: f.take("flops")?,
            params,
            prunable,
            prunable_params,
            prunable_params_zeroed: f.take("prunable_params_zeroed")?,
            weight_name: f.take("weight_name")?,
            weight_shape,
            bias_name: f.take("bias_name")?,
            bias_shape: f.take("bias_shape")?,
            attributes: f.take("attributes")?,
        };
        record.check_invariant().map_err(|detail| SchemaError::InvariantViolation { node, detail })?;
        Ok(record)
    }

    /// Checks `prunable_params_zeroed <= prunable_params <= params`.
    pub fn check_invariant(&self) -> Result<(), String> {
        if self.prunable_params > self.params {
            return Err(format!(
                "prunable_params ({}) exceeds params ({})",
                self.prunable_params, self.params
            ));
        }
        if self.prunable_params_zeroed > self.prunable_params {
            return Err(format!(
                "prunable_params_zeroed ({}) exceeds prunable_params ({})",
                self.prunable_params_zeroed, self.prunable_params
            ));
        }
        Ok(())
    }

    /// Fraction of prunable parameters that are already zero.
    pub fn sparsity(&self) -> f64 {
        if self.prunable_params == 0 {
            0.0
        } else {
            self.prunable_params_zeroed as f64 / self.prunable_params as f64
        }
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): flops={}, params={}, prunable={}",
            self.id_, self.op_type, self.flops, self.params, self.prunable_params
        )
    }
}

/// Typed access to the fields of one node object.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    node: usize,
}

impl Fields<'_> {
    fn take<T: DeserializeOwned>(&self, key: &'static str) -> Result<T, SchemaError> {
        self.take_opt(key)?.ok_or(SchemaError::MissingKey {
            node: self.node,
            key,
        })
    }

    /// Like [`Fields::take`], but an absent key is `Ok(None)`.
    fn take_opt<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, SchemaError> {
        let Some(value) = self.obj.get(key) else {
            return Ok(None);
        };
        T::deserialize(value).map(Some).map_err(|e| SchemaError::WrongType {
            node: self.node,
            key,
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv_mapping() -> Value {
        json!({
            "id": "id",
            "op_type": "Conv",
            "input_names": ["in1", "in2"],
            "output_names": ["out1"],
            "input_shapes": [[16, 3, 3, 3]],
            "output_shapes": [[16, 16, 2, 2]],
            "flops": 27712,
            "params": 448,
            "prunable": true,
            "prunable_params": 432,
            "prunable_params_zeroed": 0,
            "weight_name": "conv.section.1.weight",
            "weight_shape": [16, 3, 3, 3],
            "bias_name": "conv.section.1.bias",
            "bias_shape": [16],
            "attributes": {"kernel": 1},
        })
    }

    #[test]
    fn test_keyword_construction() {
        let node = NodeRecord::from_mapping(&conv_mapping()).unwrap();
        assert_eq!(node.id_, "id");
        assert_eq!(node.op_type, "Conv");
        assert_eq!(node.input_names, vec!["in1", "in2"]);
        assert_eq!(node.output_names, vec!["out1"]);
        assert_eq!(node.input_shapes, vec![Some(Shape::new(vec![16, 3, 3, 3]))]);
        assert_eq!(node.output_shapes, vec![Some(Shape::new(vec![16, 16, 2, 2]))]);
        assert_eq!(node.flops, Estimate::Known(27712));
        assert_eq!(node.params, 448);
        assert!(node.prunable);
        assert_eq!(node.prunable_params, 432);
        assert_eq!(node.prunable_params_zeroed, 0);
        assert_eq!(node.weight_name.as_deref(), Some("conv.section.1.weight"));
        assert_eq!(node.weight_shape, Some(Shape::new(vec![16, 3, 3, 3])));
        assert_eq!(node.bias_name.as_deref(), Some("conv.section.1.bias"));
        assert_eq!(node.bias_shape, Some(Shape::vector(16)));
        assert_eq!(node.attributes.get("kernel"), Some(&AttributeValue::Int(1)));
    }

    #[test]
    fn test_serializes_id_key() {
        let node = NodeRecord::from_mapping(&conv_mapping()).unwrap();
        let mapping = node.to_mapping();
        assert_eq!(mapping["id"], "id");
        assert!(mapping.get("id_").is_none());
        assert_eq!(mapping, conv_mapping());

        // The derived serde impl agrees with the explicit mapping.
        assert_eq!(serde_json::to_value(&node).unwrap(), mapping);
    }

    #[test]
    fn test_nulls_are_explicit() {
        let mut mapping = conv_mapping();
        mapping["flops"] = Value::Null;
        mapping["weight_name"] = Value::Null;
        mapping["weight_shape"] = Value::Null;
        mapping["input_shapes"] = json!([null, [16, 3, 3, 3]]);
        let node = NodeRecord::from_mapping(&mapping).unwrap();
        assert_eq!(node.flops, Estimate::Unknown);
        assert_eq!(node.weight_name, None);
        assert_eq!(node.input_shapes[0], None);
        assert_eq!(node.to_mapping(), mapping);
    }

    #[test]
    fn test_missing_key() {
        let mut mapping = conv_mapping();
        mapping.as_object_mut().unwrap().remove("params");
        assert_eq!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::MissingKey {
                node: 0,
                key: "params"
            })
        );

        // A missing optional is still an error; absent values must be null.
        let mut mapping = conv_mapping();
        mapping.as_object_mut().unwrap().remove("bias_name");
        assert!(matches!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::MissingKey { key: "bias_name", .. })
        ));
    }

    #[test]
    fn test_prunable_params_derived_when_absent() {
        let mut mapping = conv_mapping();
        mapping.as_object_mut().unwrap().remove("prunable_params");
        let node = NodeRecord::from_mapping(&mapping).unwrap();
        assert_eq!(node.prunable_params, 432);
        assert_eq!(node, NodeRecord::from_mapping(&conv_mapping()).unwrap());

        mapping["prunable"] = json!(false);
        assert_eq!(NodeRecord::from_mapping(&mapping).unwrap().prunable_params, 0);

        // Capped by params so the loaded record stays consistent.
        mapping["prunable"] = json!(true);
        mapping["params"] = json!(100);
        assert_eq!(NodeRecord::from_mapping(&mapping).unwrap().prunable_params, 100);

        mapping["weight_shape"] = Value::Null;
        assert_eq!(NodeRecord::from_mapping(&mapping).unwrap().prunable_params, 0);

        mapping["prunable_params"] = json!("432");
        assert!(matches!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::WrongType { key: "prunable_params", .. })
        ));
    }

    #[test]
    fn test_unknown_key() {
        let mut mapping = conv_mapping();
        mapping["id_"] = json!("id");
        assert!(matches!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::UnknownKey { key, .. }) if key == "id_"
        ));
    }

    #[test]
    fn test_wrong_type() {
        let mut mapping = conv_mapping();
        mapping["params"] = json!("448");
        assert!(matches!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::WrongType { key: "params", .. })
        ));
        assert_eq!(
            NodeRecord::from_mapping(&json!([1, 2])),
            Err(SchemaError::NotAnObject { node: 0 })
        );
    }

    #[test]
    fn test_invariant_violation() {
        let mut mapping = conv_mapping();
        mapping["prunable_params_zeroed"] = json!(500);
        assert!(matches!(
            NodeRecord::from_mapping(&mapping),
            Err(SchemaError::InvariantViolation { node: 0, .. })
        ));
        let mut mapping = conv_mapping();
        mapping["params"] = json!(10);
        assert!(NodeRecord::from_mapping(&mapping).is_err());
    }

    #[test]
    fn test_sparsity() {
        let mut node = NodeRecord::from_mapping(&conv_mapping()).unwrap();
        assert_eq!(node.sparsity(), 0.0);
        node.prunable_params_zeroed = 108;
        assert!((node.sparsity() - 0.25).abs() < 1e-12);
        assert!(node.summary().contains("Conv"));
    }
}
