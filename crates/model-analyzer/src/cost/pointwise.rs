// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Parameter-free rules: element-wise math, pooling and data movement.

use super::{kernel_product, CostInputs, CostRule, OpCost};
use crate::Estimate;
use tensor_core::Shape;

/// `flops = prod(output) * factor`.
#[derive(Debug, Clone, Copy)]
pub struct Elementwise {
    factor: u64,
}

impl Elementwise {
    pub fn new(factor: u64) -> Self {
        Self { factor }
    }
}

impl CostRule for Elementwise {
    fn name(&self) -> &str {
        "elementwise"
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        let flops = inputs
            .output(0)
            .and_then(|out| out.num_elements()?.checked_mul(self.factor));
        OpCost::compute_only(flops.into())
    }
}

/// Windowed pooling: `flops = prod(output) * prod(kernel_shape)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pool;

impl CostRule for Pool {
    fn name(&self) -> &str {
        "pool"
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        let flops = inputs
            .output(0)
            .zip(inputs.ints_attr("kernel_shape"))
            .and_then(|(out, kernel)| out.num_elements()?.checked_mul(kernel_product(kernel)?));
        OpCost::compute_only(flops.into())
    }
}

/// Whole-input reductions: `flops = prod(input)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPool;

impl CostRule for GlobalPool {
    fn name(&self) -> &str {
        "global-pool"
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        let flops = inputs.input(0).and_then(Shape::num_elements);
        OpCost::compute_only(flops.into())
    }
}

/// Operators that only move data. Always zero FLOPs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeOnly;

impl CostRule for ShapeOnly {
    fn name(&self) -> &str {
        "shape-only"
    }

    fn estimate(&self, _inputs: &CostInputs<'_>) -> OpCost {
        OpCost::compute_only(Estimate::Known(0))
    }
}
