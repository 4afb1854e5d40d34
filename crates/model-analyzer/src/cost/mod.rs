// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`CostRule`] trait and the operator cost table.
//!
//! Costs are estimated from static shape metadata only; the graph is never
//! executed. Each rule degrades to [`Estimate::Unknown`] when a shape it
//! needs is missing instead of failing.

pub mod conv;
pub mod linear;
pub mod pointwise;

use crate::Estimate;
use model_ir::AttributeValue;
use std::collections::{BTreeMap, HashMap};
use tensor_core::Shape;

pub use conv::{Conv, ConvTranspose};
pub use linear::{Gemm, MatMul};
pub use pointwise::{Elementwise, GlobalPool, Pool, ShapeOnly};

/// Input positions holding the node's parameters, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamSlots {
    /// Position of the prunable weight tensor.
    pub weight: Option<usize>,
    /// Position of the bias tensor.
    pub bias: Option<usize>,
}

impl ParamSlots {
    /// No parameters.
    pub const NONE: Self = Self {
        weight: None,
        bias: None,
    };
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    /// One entry per node input, `None` when unresolved.
    pub input_shapes: &'a [Option<Shape>],
    /// One entry per node output, `None` when unresolved.
    pub output_shapes: &'a [Option<Shape>],
    /// Selected weight slot and its shape.
    pub weight: Option<(usize, &'a Shape)>,
    /// Bias shape, if a bias was identified.
    pub bias: Option<&'a Shape>,
    pub attributes: &'a BTreeMap<String, AttributeValue>,
}

impl<'a> CostInputs<'a> {
    /// Shape of input `i`.
    pub fn input(&self, i: usize) -> Option<&'a Shape> {
        self.input_shapes.get(i).and_then(Option::as_ref)
    }

    /// Shape of output `i`.
    pub fn output(&self, i: usize) -> Option<&'a Shape> {
        self.output_shapes.get(i).and_then(Option::as_ref)
    }

    /// Weight shape, regardless of slot.
    pub fn weight_shape(&self) -> Option<&'a Shape> {
        self.weight.map(|(_, shape)| shape)
    }

    /// Integer attribute or `default`.
    pub fn int_attr(&self, name: &str, default: i64) -> i64 {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_int)
            .unwrap_or(default)
    }

    /// Integer-list attribute.
    pub fn ints_attr(&self, name: &str) -> Option<&'a [i64]> {
        self.attributes.get(name).and_then(AttributeValue::as_ints)
    }

    /// Parameter count from the identified weight and bias. Counts that
    /// overflow saturate at `u64::MAX`.
    pub fn param_elements(&self) -> (u64, u64) {
        let count = |shape: &Shape| shape.num_elements().unwrap_or(u64::MAX);
        (
            self.weight_shape().map_or(0, count),
            self.bias.map_or(0, count),
        )
    }
}

/// Cost of one operator invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCost {
    pub flops: Estimate<u64>,
    pub params: u64,
    pub prunable: bool,
    pub prunable_params: u64,
}

impl OpCost {
    /// A parameter-free operator.
    pub fn compute_only(flops: Estimate<u64>) -> Self {
        Self {
            flops,
            params: 0,
            prunable: false,
            prunable_params: 0,
        }
    }

    /// An operator whose cost cannot be estimated.
    pub const UNKNOWN: Self = Self {
        flops: Estimate::Unknown,
        params: 0,
        prunable: false,
        prunable_params: 0,
    };

    /// An operator with a prunable weight: params include the bias,
    /// prunable params do not.
    pub fn weighted(flops: Estimate<u64>, inputs: &CostInputs<'_>) -> Self {
        let (weight, bias) = inputs.param_elements();
        Self {
            flops,
            params: weight.saturating_add(bias),
            prunable: inputs.weight.is_some(),
            prunable_params: weight,
        }
    }
}

/// Trait for per-operator cost rules.
///
/// Rules are pure functions of shapes and attributes: no I/O, no graph
/// access. They are registered in a [`CostModel`] by operator type.
pub trait CostRule: Send + Sync {
    /// Human-readable name of this rule.
    fn name(&self) -> &str;

    /// Chooses the weight and bias inputs. `initializer_inputs[i]` is `true`
    /// when input `i` is a constant tensor; only those may be chosen.
    fn parameter_slots(&self, _initializer_inputs: &[bool]) -> ParamSlots {
        ParamSlots::NONE
    }

    /// Estimates the cost.
    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost;
}

/// Product of a `kernel_shape` attribute; `None` for negative or
/// overflowing entries.
pub(crate) fn kernel_product(kernel: &[i64]) -> Option<u64> {
    kernel
        .iter()
        .try_fold(1u64, |acc, &k| acc.checked_mul(u64::try_from(k).ok()?))
}

/// Returns `Some(i)` if input `i` exists and is an initializer.
pub(crate) fn slot_if_initializer(initializer_inputs: &[bool], i: usize) -> Option<usize> {
    initializer_inputs.get(i).copied().unwrap_or(false).then_some(i)
}

/// Operator type → cost rule table.
pub struct CostModel {
    rules: HashMap<String, Box<dyn CostRule>>,
}

/// Operators that only move or reshape data.
const SHAPE_ONLY: &[&str] = &[
    "Cast", "Concat", "Constant", "ConstantOfShape", "DepthToSpace", "Dropout", "Expand",
    "Flatten", "Gather", "Identity", "Pad", "Reshape", "Shape", "Slice", "SpaceToDepth",
    "Split", "Squeeze", "Tile", "Transpose", "Unsqueeze",
];

/// Built-in element-wise factors (FLOPs per output element).
const ELEMENTWISE: &[(&str, u64)] = &[
    ("Abs", 1),
    ("Add", 1),
    ("BatchNormalization", 1),
    ("Ceil", 1),
    ("Clip", 1),
    ("Div", 1),
    ("Floor", 1),
    ("LeakyRelu", 1),
    ("Max", 1),
    ("Min", 1),
    ("Mul", 1),
    ("Neg", 1),
    ("Relu", 1),
    ("Round", 1),
    ("Sigmoid", 1),
    ("Sign", 1),
    ("Sub", 1),
    ("Sum", 1),
    ("Tanh", 1),
    ("Elu", 2),
    ("HardSigmoid", 2),
    ("HardSwish", 2),
    ("PRelu", 2),
    ("Erf", 4),
    ("Exp", 4),
    ("Gelu", 4),
    ("InstanceNormalization", 4),
    ("LayerNormalization", 4),
    ("Log", 4),
    ("LogSoftmax", 4),
    ("Pow", 4),
    ("Reciprocal", 4),
    ("Softmax", 4),
    ("Softplus", 4),
    ("Sqrt", 4),
];

impl CostModel {
    /// Creates an empty table.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Creates the table with every built-in rule registered.
    pub fn standard() -> Self {
        let mut model = Self::empty();
        model.register("Conv", Box::new(Conv));
        model.register("ConvTranspose", Box::new(ConvTranspose));
        model.register("Gemm", Box::new(Gemm));
        model.register("MatMul", Box::new(MatMul));
        for &(op, factor) in ELEMENTWISE {
            model.register(op, Box::new(Elementwise::new(factor)));
        }
        for op in ["MaxPool", "AveragePool", "LpPool"] {
            model.register(op, Box::new(Pool));
        }
        for op in ["GlobalAveragePool", "GlobalMaxPool", "GlobalLpPool", "ReduceMean"] {
            model.register(op, Box::new(GlobalPool));
        }
        for &op in SHAPE_ONLY {
            model.register(op, Box::new(ShapeOnly));
        }
        model
    }

    /// Overrides or extends element-wise factors.
    pub fn with_factors(mut self, factors: &BTreeMap<String, u64>) -> Self {
        for (op, &factor) in factors {
            tracing::debug!("cost factor override: {op} = {factor}");
            self.register(op.clone(), Box::new(Elementwise::new(factor)));
        }
        self
    }

    /// Registers a rule, replacing any previous rule for `op_type`.
    pub fn register(&mut self, op_type: impl Into<String>, rule: Box<dyn CostRule>) {
        self.rules.insert(op_type.into(), rule);
    }

    /// Returns the rule for an operator type.
    pub fn rule(&self, op_type: &str) -> Option<&dyn CostRule> {
        self.rules.get(op_type).map(|r| r.as_ref())
    }

    /// Registered operator types, sorted.
    pub fn op_types(&self) -> Vec<&str> {
        let mut ops: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        ops.sort_unstable();
        ops
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for CostModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostModel")
            .field("op_types", &self.op_types())
            .finish()
    }
}
