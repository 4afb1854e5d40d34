// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix-multiply cost rules.
//!
//! # FLOP Model
//!
//! With a constant weight `[K, N]` the cost is counted per sample:
//!
//! ```text
//! flops = 2 * M * K * N + bias_elements
//! ```
//!
//! where `M` is the product of the activation's dims between the batch axis
//! and the reduction axis (1 for a 2-D activation). Multiplying two
//! activations counts every output element of every batch:
//!
//! ```text
//! flops = prod(output[..r-2]) * rows * cols * (2K - 1)
//! ```

use super::{slot_if_initializer, CostInputs, CostRule, OpCost, ParamSlots};
use tensor_core::Shape;

/// General matrix multiply `Y = alpha * A' * B' + beta * C`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gemm;

/// Numpy-style batched matrix multiply.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatMul;

/// Rows of a per-sample product: dims strictly between batch and reduction.
fn sample_rows(activation: &Shape) -> Option<u64> {
    activation.product_of(1..activation.rank().saturating_sub(1))
}

impl CostRule for Gemm {
    fn name(&self) -> &str {
        "gemm"
    }

    fn parameter_slots(&self, initializer_inputs: &[bool]) -> ParamSlots {
        ParamSlots {
            weight: slot_if_initializer(initializer_inputs, 1),
            bias: slot_if_initializer(initializer_inputs, 2),
        }
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        OpCost::weighted(gemm_flops(inputs).into(), inputs)
    }
}

impl CostRule for MatMul {
    fn name(&self) -> &str {
        "matmul"
    }

    fn parameter_slots(&self, initializer_inputs: &[bool]) -> ParamSlots {
        ParamSlots {
            weight: slot_if_initializer(initializer_inputs, 1)
                .or_else(|| slot_if_initializer(initializer_inputs, 0)),
            bias: None,
        }
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        match inputs.weight {
            Some((slot, weight)) => {
                OpCost::weighted(weighted_matmul(inputs, slot, weight).into(), inputs)
            }
            None => OpCost::compute_only(activation_matmul(inputs).into()),
        }
    }
}

/// Per-sample Gemm cost; `transB` selects the weight layout.
fn gemm_flops(inputs: &CostInputs<'_>) -> Option<u64> {
    let b = inputs.weight_shape().or_else(|| inputs.input(1))?;
    if b.rank() != 2 {
        return None;
    }
    let (k, n) = if inputs.int_attr("transB", 0) != 0 {
        (b.dims()[1], b.dims()[0])
    } else {
        (b.dims()[0], b.dims()[1])
    };
    let bias = match inputs.bias {
        Some(bias) => bias.num_elements()?,
        None => 0,
    };
    checked_product(&[2, k as u64, n as u64])?.checked_add(bias)
}

/// Product with one constant operand.
fn weighted_matmul(inputs: &CostInputs<'_>, slot: usize, weight: &Shape) -> Option<u64> {
    let r = weight.rank();
    if r < 2 {
        return None;
    }
    let (w_rows, w_cols) = (weight.dims()[r - 2] as u64, weight.dims()[r - 1] as u64);
    if slot == 1 {
        // [.., M, K] x W[K, N]
        let rows = sample_rows(inputs.input(0)?)?;
        checked_product(&[2, rows, w_rows, w_cols])
    } else {
        // W[M, K] x [.., K, N]
        let cols = inputs.input(1)?.last()? as u64;
        checked_product(&[2, w_rows, w_cols, cols])
    }
}

/// Product of two activations, counted over the full output.
fn activation_matmul(inputs: &CostInputs<'_>) -> Option<u64> {
    let k = inputs.input(0)?.last()? as u64;
    let out = inputs.output(0)?;
    let dims = out.dims();
    let (batch, rows, cols) = match dims.len() {
        0 => (1, 1, 1),
        1 => (1, 1, dims[0] as u64),
        n => (
            out.product_of(0..n - 2)?,
            dims[n - 2] as u64,
            dims[n - 1] as u64,
        ),
    };
    let per_element = k.checked_mul(2)?.saturating_sub(1);
    checked_product(&[batch, rows, cols, per_element])
}

fn checked_product(factors: &[u64]) -> Option<u64> {
    factors.iter().try_fold(1u64, |acc, &f| acc.checked_mul(f))
}
