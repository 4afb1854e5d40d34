// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Convolution cost rules.
//!
//! # FLOP Model
//!
//! ```text
//! Conv:          flops = prod(kernel) * weight[1] * prod(output)
//!                      + bias_elements * prod(output[2..])
//! ConvTranspose: flops = prod(kernel) * weight[1] * prod(input)
//!                      + bias_elements * prod(output[2..])
//! ```
//!
//! `weight[1]` is the per-group channel count on the reduction side, so the
//! product already accounts for grouped and depthwise convolutions. The
//! kernel comes from `kernel_shape`, falling back to `weight[2..]`.

use super::{kernel_product, slot_if_initializer, CostInputs, CostRule, OpCost, ParamSlots};
use tensor_core::Shape;

/// Standard (possibly grouped) convolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conv;

/// Transposed convolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvTranspose;

fn conv_slots(initializer_inputs: &[bool]) -> ParamSlots {
    ParamSlots {
        weight: slot_if_initializer(initializer_inputs, 1),
        bias: slot_if_initializer(initializer_inputs, 2),
    }
}

/// Kernel element count from the attribute or the weight's trailing dims.
fn kernel_elements(inputs: &CostInputs<'_>, weight: Option<&Shape>) -> Option<u64> {
    if let Some(kernel) = inputs.ints_attr("kernel_shape") {
        return kernel_product(kernel);
    }
    let weight = weight.filter(|w| w.rank() > 2)?;
    weight.product_of(2..weight.rank())
}

/// Shared formula: `prod(kernel) * weight[1] * positions + bias term`.
fn conv_flops(inputs: &CostInputs<'_>, positions: Option<&Shape>) -> Option<u64> {
    // The weight may be an activation (e.g., produced by a quantize node).
    let weight = inputs.weight_shape().or_else(|| inputs.input(1));
    let kernel = kernel_elements(inputs, weight)?;
    let channels = weight?.dim(1)? as u64;
    let positions = positions?.num_elements()?;
    let bias = match inputs.bias {
        Some(bias) => {
            let output = inputs.output(0)?;
            bias.num_elements()?.checked_mul(output.product_of(2..output.rank())?)?
        }
        None => 0,
    };
    kernel
        .checked_mul(channels)?
        .checked_mul(positions)?
        .checked_add(bias)
}

impl CostRule for Conv {
    fn name(&self) -> &str {
        "conv"
    }

    fn parameter_slots(&self, initializer_inputs: &[bool]) -> ParamSlots {
        conv_slots(initializer_inputs)
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        OpCost::weighted(conv_flops(inputs, inputs.output(0)).into(), inputs)
    }
}

impl CostRule for ConvTranspose {
    fn name(&self) -> &str {
        "conv-transpose"
    }

    fn parameter_slots(&self, initializer_inputs: &[bool]) -> ParamSlots {
        conv_slots(initializer_inputs)
    }

    fn estimate(&self, inputs: &CostInputs<'_>) -> OpCost {
        OpCost::weighted(conv_flops(inputs, inputs.input(0)).into(), inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::tests::{shape, Fixture};
    use crate::Estimate;
    use model_ir::AttributeValue;

    fn conv_fixture() -> Fixture {
        Fixture::new(
            vec![shape(&[16, 3, 4, 4]), shape(&[16, 3, 3, 3]), shape(&[16])],
            vec![shape(&[16, 16, 2, 2])],
        )
        .weight(1, &[16, 3, 3, 3])
        .attr("kernel_shape", AttributeValue::Ints(vec![3, 3]))
    }

    #[test]
    fn test_conv_with_bias() {
        let fx = conv_fixture().bias(&[16]);
        let cost = Conv.estimate(&fx.inputs());
        assert_eq!(cost.flops, Estimate::Known(27712));
        assert_eq!(cost.params, 448);
        assert!(cost.prunable);
        assert_eq!(cost.prunable_params, 432);
    }

    #[test]
    fn test_conv_without_bias() {
        let fx = conv_fixture();
        let cost = Conv.estimate(&fx.inputs());
        assert_eq!(cost.flops, Estimate::Known(27648));
        assert_eq!(cost.params, 432);
        assert_eq!(cost.prunable_params, 432);
    }

    #[test]
    fn test_kernel_from_weight_when_attribute_missing() {
        let mut fx = conv_fixture();
        fx.attributes.clear();
        assert_eq!(Conv.estimate(&fx.inputs()).flops, Estimate::Known(27648));
    }

    #[test]
    fn test_depthwise_conv() {
        // 32 groups of 1 channel each: weight [32, 1, 3, 3].
        let fx = Fixture::new(
            vec![shape(&[1, 32, 8, 8]), shape(&[32, 1, 3, 3])],
            vec![shape(&[1, 32, 8, 8])],
        )
        .weight(1, &[32, 1, 3, 3])
        .attr("group", AttributeValue::Int(32));
        assert_eq!(Conv.estimate(&fx.inputs()).flops, Estimate::Known(9 * 32 * 64));
    }

    #[test]
    fn test_missing_output_shape_is_unknown() {
        let fx = Fixture::new(vec![shape(&[1, 3, 4, 4]), shape(&[16, 3, 3, 3])], vec![None])
            .weight(1, &[16, 3, 3, 3])
            .bias(&[16]);
        let cost = Conv.estimate(&fx.inputs());
        assert_eq!(cost.flops, Estimate::Unknown);
        assert_eq!(cost.params, 448);
        assert!(cost.prunable);
    }

    #[test]
    fn test_overflowing_output_is_unknown() {
        let fx = Fixture::new(
            vec![shape(&[1, 3, 4, 4]), shape(&[16, 3, 3, 3])],
            vec![shape(&[1 << 31, 1 << 31, 1 << 31, 1])],
        )
        .weight(1, &[16, 3, 3, 3]);
        let cost = Conv.estimate(&fx.inputs());
        assert_eq!(cost.flops, Estimate::Unknown);
        assert_eq!(cost.params, 432);
    }

    #[test]
    fn test_conv_slots() {
        assert_eq!(
            Conv.parameter_slots(&[false, true, true]),
            ParamSlots {
                weight: Some(1),
                bias: Some(2)
            }
        );
        assert_eq!(Conv.parameter_slots(&[false, false]), ParamSlots::NONE);
    }

    #[test]
    fn test_conv_transpose() {
        // Weight [C_in=8, C_out/group=4, 2, 2], input [1, 8, 3, 3].
        let fx = Fixture::new(
            vec![shape(&[1, 8, 3, 3]), shape(&[8, 4, 2, 2])],
            vec![shape(&[1, 4, 6, 6])],
        )
        .weight(1, &[8, 4, 2, 2])
        .bias(&[4]);
        let cost = ConvTranspose.estimate(&fx.inputs());
        assert_eq!(cost.flops, Estimate::Known(4 * 4 * 72 + 4 * 36));
        assert_eq!(cost.params, 132);
    }
}
