mod fold;
mod freeze;
mod rules;

use splice_ir::{AttrValue, Graph, TensorData};

pub(crate) fn kinds(graph: &Graph) -> Vec<String> {
    graph.order().iter().map(|&n| graph.node(n).kind.to_string()).collect()
}

/// `[2, 3]` linear weight (two output features over three input features).
pub(crate) fn linear_weight() -> AttrValue {
    AttrValue::Tensor(TensorData::new([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
}

pub(crate) fn linear_bias() -> AttrValue {
    AttrValue::Tensor(TensorData::new([2], vec![0.5, -0.5]))
}

/// `[1, 1, 2, 2]` conv kernel.
pub(crate) fn conv_weight() -> AttrValue {
    AttrValue::Tensor(TensorData::new([1, 1, 2, 2], vec![1.0, 0.0, 0.0, 1.0]))
}

pub(crate) fn conv_bias() -> AttrValue {
    AttrValue::Tensor(TensorData::new([1], vec![0.0]))
}
