//! Parameter freezing.
//!
//! `prim::get_attr` nodes reading a declared module parameter become
//! `prim::constant` nodes carrying the parameter's value, per module, so
//! later folding sees concrete tensors. A small propagation step also
//! resolves `nn::t` over constant rank-2 tensors, which freeze regularly
//! exposes.

use splice_ir::{AttrValue, Graph, NodeId};

use crate::error::Result;
use crate::kinds;
use crate::module::Module;

pub fn freeze(module: &mut Module, preserved: &[&str]) -> Result<()> {
    module.for_each_module_mut(&mut |m| {
        let mut materialized = 0usize;
        let name = m.name.clone();
        let (methods, params) = m.split_methods_and_parameters();
        for method in methods {
            if preserved.contains(&method.name.as_str()) {
                continue;
            }
            materialized += materialize_parameters(&mut method.graph, params)?;
            propagate_transpose(&mut method.graph)?;
            method.graph.validate()?;
        }
        if materialized > 0 {
            tracing::debug!(module = %name, materialized, "froze parameters");
        }
        Ok(())
    })
}

fn materialize_parameters(graph: &mut Graph, params: &[(String, AttrValue)]) -> Result<usize> {
    let mut count = 0usize;
    for id in graph.order().to_vec() {
        let node = graph.node(id);
        if node.kind != kinds::GET_ATTR {
            continue;
        }
        let Some(name) = node.attr("name").and_then(AttrValue::as_str).map(str::to_owned) else {
            continue;
        };
        let Some((_, value)) = params.iter().find(|(n, _)| *n == name) else {
            continue;
        };
        let value = value.clone();
        let out = graph.node(id).outputs[0];
        let pos = graph.position(id);
        let replacement = graph.insert_constant_at(pos, value, Some(name), None);
        graph.replace_all_uses_with(out, replacement);
        graph.destroy_node(id)?;
        count += 1;
    }
    Ok(count)
}

/// `nn::t` over a constant rank-2 tensor folds to the transposed constant.
fn propagate_transpose(graph: &mut Graph) -> Result<()> {
    loop {
        let Some(id) = find_foldable_transpose(graph) else {
            return Ok(());
        };
        let input = graph.node(id).inputs[0];
        let Some(tensor) = graph.constant_value(input).and_then(AttrValue::as_tensor).cloned()
        else {
            unreachable!("find_foldable_transpose only returns constant-fed nodes");
        };
        let out = graph.node(id).outputs[0];
        let out_name = graph.value(out).name.clone();
        let pos = graph.position(id);
        let replacement =
            graph.insert_constant_at(pos, AttrValue::Tensor(tensor.transpose2d()), out_name, None);
        graph.replace_all_uses_with(out, replacement);
        graph.destroy_node(id)?;
        if graph.uses(input).is_empty()
            && !graph.outputs.contains(&input)
            && let Some(producer) = graph.producer_node(input)
        {
            graph.destroy_node(producer)?;
        }
    }
}

fn find_foldable_transpose(graph: &Graph) -> Option<NodeId> {
    graph.order().iter().copied().find(|&id| {
        let node = graph.node(id);
        node.kind == kinds::TRANSPOSE
            && node.inputs.len() == 1
            && graph
                .constant_value(node.inputs[0])
                .and_then(AttrValue::as_tensor)
                .is_some_and(|t| t.rank() == 2)
    })
}
