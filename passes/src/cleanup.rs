//! Cleanup steps run after folding.

use splice_ir::{AttrValue, Graph, NodeId, Symbol, SubgraphRewriter, VALUE_ATTR, ValueId};

use crate::error::Result;
use crate::helpers::is_constant_false;
use crate::kinds;
use crate::module::Module;

/// Inference-time dropout is the identity; remove it when `train` is the
/// constant `false`.
pub fn remove_dropout(module: &mut Module, preserved: &[&str]) -> Result<()> {
    let mut rewriter = SubgraphRewriter::new();
    rewriter.register_rewrite_pattern(
        "graph(%input, %p, %train):
            %res = nn::dropout(%input, %p, %train)
            return (%res)",
        "graph(%input):
            return (%input)",
        vec![],
    )?;
    module.for_each_graph_mut(preserved, &mut |graph| {
        rewriter.run_on_graph_filtered(graph, |m, names, g| {
            m.bound(names, "train").is_some_and(|v| is_constant_false(g, v))
        })?;
        Ok(())
    })
}

/// In-place activations left after clamp fusion become their functional
/// counterparts; value semantics make the distinction meaningless here.
pub fn remove_mutation(module: &mut Module, preserved: &[&str]) -> Result<()> {
    module.for_each_graph_mut(preserved, &mut |graph| {
        for id in graph.order().to_vec() {
            let kind = graph.node(id).kind.clone();
            let functional = if kind == kinds::RELU_INPLACE {
                kinds::RELU
            } else if kind == kinds::HARDTANH_INPLACE {
                kinds::HARDTANH
            } else {
                continue;
            };
            graph.set_kind(id, Symbol::new(functional));
        }
        Ok(())
    })
}

/// Constant pooling plus dead-node elimination.
pub fn canonical_cleanup(module: &mut Module, preserved: &[&str]) -> Result<()> {
    module.for_each_graph_mut(preserved, &mut |graph| {
        pool_constants(graph)?;
        eliminate_dead_nodes(graph)?;
        graph.validate()?;
        Ok(())
    })
}

/// Merge duplicate `prim::constant` nodes with equal literal and type.
/// Packed constants compare by identity and are left alone.
fn pool_constants(graph: &mut Graph) -> Result<()> {
    let mut representatives: Vec<(AttrValue, Option<splice_ir::TypeAnn>, ValueId)> = Vec::new();
    for id in graph.order().to_vec() {
        if !graph.is_live_node(id) {
            continue;
        }
        let node = graph.node(id);
        if !node.is_constant() {
            continue;
        }
        let Some(value) = node.attr(VALUE_ATTR).cloned() else {
            continue;
        };
        if matches!(value, AttrValue::Packed(_)) {
            continue;
        }
        let out = node.outputs[0];
        let ty = graph.value(out).ty.clone();
        let canonical = representatives
            .iter()
            .find(|(v, t, _)| *v == value && *t == ty)
            .map(|&(_, _, rep)| rep);
        match canonical {
            Some(rep) => {
                graph.replace_all_uses_with(out, rep);
                graph.destroy_node(id)?;
            }
            None => representatives.push((value, ty, out)),
        }
    }
    Ok(())
}

/// Drop nodes whose outputs are neither used nor returned, repeatedly,
/// so whole dead chains disappear.
fn eliminate_dead_nodes(graph: &mut Graph) -> Result<()> {
    loop {
        let dead: Vec<NodeId> = graph
            .order()
            .iter()
            .rev()
            .copied()
            .filter(|&id| {
                graph
                    .node(id)
                    .outputs
                    .iter()
                    .all(|&o| graph.uses(o).is_empty() && !graph.outputs.contains(&o))
            })
            .collect();
        if dead.is_empty() {
            return Ok(());
        }
        for id in dead {
            graph.destroy_node(id)?;
        }
    }
}
