//! Re-fusion of decomposed linear layers.
//!
//! Traced graphs often carry `t` + `matmul` + `add` (or `t` + `addmm`)
//! where the source had a single linear layer. Fusing them back first lets
//! the prepack insertion see one `nn::linear` node.

use splice_ir::{AttrValue, SubgraphRewriter};

use crate::error::Result;
use crate::module::Module;

pub fn fuse_decomposed(module: &mut Module, preserved: &[&str]) -> Result<()> {
    let mut matmul_add = SubgraphRewriter::new();
    matmul_add.register_rewrite_pattern(
        "graph(%input, %weight, %bias):
            %weight_t = nn::t(%weight)
            %mm = nn::matmul(%input, %weight_t)
            %res = nn::add(%mm, %bias)
            return (%res)",
        "graph(%input, %weight, %bias):
            %res = nn::linear(%input, %weight, %bias)
            return (%res)",
        vec![],
    )?;

    let mut addmm = SubgraphRewriter::new();
    addmm.register_rewrite_pattern(
        "graph(%input, %weight, %bias, %beta, %alpha):
            %weight_t = nn::t(%weight)
            %res = nn::addmm(%bias, %input, %weight_t, %beta, %alpha)
            return (%res)",
        "graph(%input, %weight, %bias):
            %res = nn::linear(%input, %weight, %bias)
            return (%res)",
        vec![],
    )?;

    module.for_each_graph_mut(preserved, &mut |graph| {
        matmul_add.run_on_graph(graph)?;
        // addmm scales its operands; only the identity scaling is a linear
        addmm.run_on_graph_filtered(graph, |m, names, g| {
            let is_one = |name: &str| {
                m.bound(names, name).and_then(|v| g.constant_value(v)).is_some_and(|c| {
                    matches!(c, AttrValue::Int(1)) || matches!(c, AttrValue::Float(f) if *f == 1.0)
                })
            };
            is_one("beta") && is_one("alpha")
        })?;
        Ok(())
    })
}
