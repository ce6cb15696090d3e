//! Prepack insertion.
//!
//! Splits each supported layer op into a backend prepack op over its
//! static arguments and a run op over the activation. Clamp-capable
//! prepack kinds take both bounds as `None` here; the clamp fusion pass
//! fills them in when an activation follows.

use splice_ir::SubgraphRewriter;

use crate::error::Result;
use crate::helpers::func_name;
use crate::module::Module;

pub fn insert_prepack_ops(module: &mut Module, preserved: &[&str]) -> Result<()> {
    let mut direct = SubgraphRewriter::new();
    direct.register_rewrite_pattern(
        "graph(%input, %weight, %bias):
            %res = nn::linear(%input, %weight, %bias)
            return (%res)",
        "graph(%input, %weight, %bias):
            %packed : vk::LinearContext = vk::linear_prepack(%weight, %bias)
            %res = vk::linear_run(%input, %packed)
            return (%res)",
        vec![],
    )?;
    direct.register_rewrite_pattern(
        "graph(%input, %weight, %bias, %stride : int[], %padding : int[], %dilation : int[], %groups : int):
            %res = nn::conv2d(%input, %weight, %bias, %stride, %padding, %dilation, %groups)
            return (%res)",
        "graph(%input, %weight, %bias, %stride : int[], %padding : int[], %dilation : int[], %groups : int):
            %output_min_max : None = prim::constant[value=None]()
            %packed : vk::Conv2dContext = vk::conv2d_clamp_prepack(%weight, %bias, %stride, %padding, %dilation, %groups, %output_min_max, %output_min_max)
            %res = vk::conv2d_clamp_run(%input, %packed)
            return (%res)",
        vec![],
    )?;
    direct.register_rewrite_pattern(
        "graph(%input, %weight, %bias, %stride : int[], %padding : int[], %output_padding : int[], %groups : int, %dilation : int[]):
            %res = nn::conv_transpose2d(%input, %weight, %bias, %stride, %padding, %output_padding, %groups, %dilation)
            return (%res)",
        "graph(%input, %weight, %bias, %stride : int[], %padding : int[], %output_padding : int[], %groups : int, %dilation : int[]):
            %output_min_max : None = prim::constant[value=None]()
            %packed : vk::Conv2dContext = vk::conv2d_transpose_clamp_prepack(%weight, %bias, %stride, %padding, %output_padding, %dilation, %groups, %output_min_max, %output_min_max)
            %res = vk::conv2d_transpose_clamp_run(%input, %packed)
            return (%res)",
        vec![],
    )?;

    // scripted code can reach linear through a function value instead of a
    // direct call; the callee identity is checked by the filter
    let mut called = SubgraphRewriter::new();
    called.register_rewrite_pattern(
        "graph(%linear, %input, %weight, %bias):
            %res = prim::call_function(%linear, %input, %weight, %bias)
            return (%res)",
        "graph(%input, %weight, %bias):
            %packed : vk::LinearContext = vk::linear_prepack(%weight, %bias)
            %res = vk::linear_run(%input, %packed)
            return (%res)",
        vec![],
    )?;

    module.for_each_graph_mut(preserved, &mut |graph| {
        direct.run_on_graph(graph)?;
        called.run_on_graph_filtered(graph, |m, names, g| {
            m.bound(names, "linear").and_then(|v| func_name(g, v)) == Some("linear")
        })?;
        Ok(())
    })
}
