//! Operation kinds the passes rewrite between.

pub const LINEAR: &str = "nn::linear";
pub const CONV2D: &str = "nn::conv2d";
pub const CONV_TRANSPOSE2D: &str = "nn::conv_transpose2d";
pub const MATMUL: &str = "nn::matmul";
pub const ADD: &str = "nn::add";
pub const ADDMM: &str = "nn::addmm";
pub const TRANSPOSE: &str = "nn::t";
pub const RELU: &str = "nn::relu";
pub const RELU_INPLACE: &str = "nn::relu_";
pub const HARDTANH: &str = "nn::hardtanh";
pub const HARDTANH_INPLACE: &str = "nn::hardtanh_";
pub const DROPOUT: &str = "nn::dropout";

pub const GET_ATTR: &str = "prim::get_attr";
pub const CALL_FUNCTION: &str = "prim::call_function";

pub const LINEAR_PREPACK: &str = "vk::linear_prepack";
pub const LINEAR_RUN: &str = "vk::linear_run";
pub const CONV2D_CLAMP_PREPACK: &str = "vk::conv2d_clamp_prepack";
pub const CONV2D_CLAMP_RUN: &str = "vk::conv2d_clamp_run";
pub const CONV_TRANSPOSE2D_CLAMP_PREPACK: &str = "vk::conv2d_transpose_clamp_prepack";
pub const CONV_TRANSPOSE2D_CLAMP_RUN: &str = "vk::conv2d_transpose_clamp_run";
