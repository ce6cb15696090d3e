//! The `vk` backend: packed-context types and evaluator registration.
//!
//! Prepack evaluators run at optimization time over constant inputs and
//! produce the opaque contexts the `*_run` kinds consume at execution
//! time. Weights are stored pre-transposed so the run path multiplies
//! without reshuffling.

use splice_ir::{AttrValue, PackedConstant, Symbol, TensorData, TypeAnn};

use crate::error::{BadPrepackInputSnafu, Result};
use crate::kinds;
use crate::registry::OpRegistry;

/// Every kind the pipeline may rewrite into. Checked up front by
/// [`OpRegistry::ensure_ops`].
pub const REQUIRED_OPS: &[&str] = &[
    kinds::LINEAR_PREPACK,
    kinds::LINEAR_RUN,
    kinds::CONV2D_CLAMP_PREPACK,
    kinds::CONV2D_CLAMP_RUN,
    kinds::CONV_TRANSPOSE2D_CLAMP_PREPACK,
    kinds::CONV_TRANSPOSE2D_CLAMP_RUN,
];

pub const LINEAR_CONTEXT: &str = "vk::LinearContext";
pub const CONV2D_CONTEXT: &str = "vk::Conv2dContext";

#[derive(Debug, Clone, PartialEq)]
pub struct LinearPackedContext {
    /// `[in_features, out_features]`, transposed from the declared weight.
    pub weight: TensorData,
    pub bias: Option<TensorData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conv2dPackedContext {
    pub weight: TensorData,
    pub bias: Option<TensorData>,
    pub stride: Vec<i64>,
    pub padding: Vec<i64>,
    pub output_padding: Vec<i64>,
    pub dilation: Vec<i64>,
    pub groups: i64,
    pub output_min: Option<f64>,
    pub output_max: Option<f64>,
    pub transposed: bool,
}

fn expect_tensor<'a>(kind: &'static str, inputs: &'a [AttrValue], index: usize) -> Result<&'a TensorData> {
    inputs[index]
        .as_tensor()
        .ok_or_else(|| BadPrepackInputSnafu { kind, index, expected: "Tensor" }.build())
}

fn opt_tensor<'a>(kind: &'static str, inputs: &'a [AttrValue], index: usize) -> Result<Option<&'a TensorData>> {
    match &inputs[index] {
        AttrValue::None => Ok(None),
        other => other
            .as_tensor()
            .map(Some)
            .ok_or_else(|| BadPrepackInputSnafu { kind, index, expected: "Tensor or None" }.build()),
    }
}

fn expect_int_list(kind: &'static str, inputs: &[AttrValue], index: usize) -> Result<Vec<i64>> {
    inputs[index]
        .as_int_list()
        .map(<[i64]>::to_vec)
        .ok_or_else(|| BadPrepackInputSnafu { kind, index, expected: "int[]" }.build())
}

fn expect_int(kind: &'static str, inputs: &[AttrValue], index: usize) -> Result<i64> {
    inputs[index]
        .as_int()
        .ok_or_else(|| BadPrepackInputSnafu { kind, index, expected: "int" }.build())
}

fn opt_float(kind: &'static str, inputs: &[AttrValue], index: usize) -> Result<Option<f64>> {
    match &inputs[index] {
        AttrValue::None => Ok(None),
        other => other
            .as_float()
            .map(Some)
            .ok_or_else(|| BadPrepackInputSnafu { kind, index, expected: "float or None" }.build()),
    }
}

fn pack_linear(inputs: &[AttrValue]) -> Result<PackedConstant> {
    const KIND: &str = kinds::LINEAR_PREPACK;
    let weight = expect_tensor(KIND, inputs, 0)?;
    let bias = opt_tensor(KIND, inputs, 1)?;
    Ok(PackedConstant::new(
        Symbol::new(KIND),
        LinearPackedContext { weight: weight.transpose2d(), bias: bias.cloned() },
    ))
}

fn pack_conv2d(inputs: &[AttrValue]) -> Result<PackedConstant> {
    const KIND: &str = kinds::CONV2D_CLAMP_PREPACK;
    Ok(PackedConstant::new(
        Symbol::new(KIND),
        Conv2dPackedContext {
            weight: expect_tensor(KIND, inputs, 0)?.clone(),
            bias: opt_tensor(KIND, inputs, 1)?.cloned(),
            stride: expect_int_list(KIND, inputs, 2)?,
            padding: expect_int_list(KIND, inputs, 3)?,
            output_padding: vec![0, 0],
            dilation: expect_int_list(KIND, inputs, 4)?,
            groups: expect_int(KIND, inputs, 5)?,
            output_min: opt_float(KIND, inputs, 6)?,
            output_max: opt_float(KIND, inputs, 7)?,
            transposed: false,
        },
    ))
}

fn pack_conv_transpose2d(inputs: &[AttrValue]) -> Result<PackedConstant> {
    const KIND: &str = kinds::CONV_TRANSPOSE2D_CLAMP_PREPACK;
    Ok(PackedConstant::new(
        Symbol::new(KIND),
        Conv2dPackedContext {
            weight: expect_tensor(KIND, inputs, 0)?.clone(),
            bias: opt_tensor(KIND, inputs, 1)?.cloned(),
            stride: expect_int_list(KIND, inputs, 2)?,
            padding: expect_int_list(KIND, inputs, 3)?,
            output_padding: expect_int_list(KIND, inputs, 4)?,
            dilation: expect_int_list(KIND, inputs, 5)?,
            groups: expect_int(KIND, inputs, 6)?,
            output_min: opt_float(KIND, inputs, 7)?,
            output_max: opt_float(KIND, inputs, 8)?,
            transposed: true,
        },
    ))
}

/// Registry for the `vk` backend with all prepack evaluators installed.
pub fn registry() -> OpRegistry {
    let mut r = OpRegistry::new("vk");
    r.register(kinds::LINEAR_PREPACK, 2, TypeAnn::Opaque(Symbol::new(LINEAR_CONTEXT)), pack_linear);
    r.register(kinds::CONV2D_CLAMP_PREPACK, 8, TypeAnn::Opaque(Symbol::new(CONV2D_CONTEXT)), pack_conv2d);
    r.register(
        kinds::CONV_TRANSPOSE2D_CLAMP_PREPACK,
        9,
        TypeAnn::Opaque(Symbol::new(CONV2D_CONTEXT)),
        pack_conv_transpose2d,
    );
    r.register_run(kinds::LINEAR_RUN);
    r.register_run(kinds::CONV2D_CLAMP_RUN);
    r.register_run(kinds::CONV_TRANSPOSE2D_CLAMP_RUN);
    r
}
