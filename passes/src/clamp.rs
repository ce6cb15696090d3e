//! Clamp fusion.
//!
//! A `hardtanh` or `relu` following a clamp-capable run op folds into the
//! prepack's bound arguments, so the backend applies the activation inside
//! the packed op. Only bounds that trace to constants are fusable; runtime
//! bounds leave the activation in place.

use std::collections::HashMap;

use splice_ir::{Graph, Match, SubgraphRewriter, ValueId};

use crate::error::Result;
use crate::helpers::is_constant;
use crate::kinds;
use crate::module::Module;

struct ClampTarget {
    prepack: &'static str,
    run: &'static str,
    /// prepack arguments ahead of the two bound slots
    args: &'static str,
}

const TARGETS: &[ClampTarget] = &[
    ClampTarget {
        prepack: kinds::CONV2D_CLAMP_PREPACK,
        run: kinds::CONV2D_CLAMP_RUN,
        args: "%weight, %bias, %stride, %padding, %dilation, %groups",
    },
    ClampTarget {
        prepack: kinds::CONV_TRANSPOSE2D_CLAMP_PREPACK,
        run: kinds::CONV_TRANSPOSE2D_CLAMP_RUN,
        args: "%weight, %bias, %stride, %padding, %output_padding, %dilation, %groups",
    },
];

fn hardtanh_rule(target: &ClampTarget, activation: &str) -> (String, String) {
    let ClampTarget { prepack, run, args } = target;
    let before = format!(
        "graph(%input, {args}, %dummy_min_max, %min, %max):
            %packed = {prepack}({args}, %dummy_min_max, %dummy_min_max)
            %intermediate = {run}(%input, %packed)
            %res = {activation}(%intermediate, %min, %max)
            return (%res)"
    );
    let after = format!(
        "graph(%input, {args}, %dummy_min_max, %min, %max):
            %packed : vk::Conv2dContext = {prepack}({args}, %min, %max)
            %res = {run}(%input, %packed)
            return (%res)"
    );
    (before, after)
}

fn relu_rule(target: &ClampTarget, activation: &str) -> (String, String) {
    let ClampTarget { prepack, run, args } = target;
    let before = format!(
        "graph(%input, {args}, %dummy_min_max):
            %packed = {prepack}({args}, %dummy_min_max, %dummy_min_max)
            %intermediate = {run}(%input, %packed)
            %res = {activation}(%intermediate)
            return (%res)"
    );
    let after = format!(
        "graph(%input, {args}, %dummy_min_max):
            %zero : float = prim::constant[value=0.0]()
            %none : None = prim::constant[value=None]()
            %packed : vk::Conv2dContext = {prepack}({args}, %zero, %none)
            %res = {run}(%input, %packed)
            return (%res)"
    );
    (before, after)
}

fn mapping() -> Vec<(String, String)> {
    vec![("packed".into(), "packed".into()), ("res".into(), "res".into())]
}

/// Bounds being folded into the packed op must be compile-time constants.
fn clamp_fusable(m: &Match, names: &HashMap<String, ValueId>, graph: &Graph) -> bool {
    ["dummy_min_max", "min", "max"].iter().all(|name| match m.bound(names, name) {
        Some(v) => is_constant(graph, v),
        // rule without this operand (relu has no explicit bounds)
        None => true,
    })
}

pub fn fuse_clamp_ops(module: &mut Module, preserved: &[&str]) -> Result<()> {
    let mut rewriter = SubgraphRewriter::new();
    for target in TARGETS {
        for activation in [kinds::HARDTANH, kinds::HARDTANH_INPLACE] {
            let (before, after) = hardtanh_rule(target, activation);
            rewriter.register_rewrite_pattern(&before, &after, mapping())?;
        }
        for activation in [kinds::RELU, kinds::RELU_INPLACE] {
            let (before, after) = relu_rule(target, activation);
            rewriter.register_rewrite_pattern(&before, &after, mapping())?;
        }
    }
    module.for_each_graph_mut(preserved, &mut |graph| {
        rewriter.run_on_graph_filtered(graph, clamp_fusable)?;
        Ok(())
    })
}
