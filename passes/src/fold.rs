//! Prepack constant folding.
//!
//! Every node whose kind has a registry evaluator and whose inputs are all
//! constants is evaluated once at optimization time. The node is replaced
//! by a `prim::constant` carrying the packed result, typed with the
//! entry's declared result type; constant inputs left without consumers
//! are dropped. Nodes with any non-constant input are skipped untouched.
//! The packed results are additionally registered on the owning module as
//! `{attr_prefix}_{n}` attributes.

use splice_ir::{AttrValue, Graph, NodeId, PackedConstant};

use crate::error::Result;
use crate::module::Module;
use crate::registry::OpRegistry;

pub fn fold_prepack_ops(
    module: &mut Module,
    registry: &OpRegistry,
    attr_prefix: &str,
    preserved: &[&str],
) -> Result<()> {
    module.for_each_module_mut(&mut |m| {
        let mut folded: Vec<PackedConstant> = Vec::new();
        for method in m.methods_mut() {
            if preserved.contains(&method.name.as_str()) {
                continue;
            }
            fold_graph(&mut method.graph, registry, &mut folded)?;
        }
        for (n, packed) in folded.into_iter().enumerate() {
            m.register_attribute(format!("{attr_prefix}_{n}"), AttrValue::Packed(packed));
        }
        Ok(())
    })
}

fn fold_graph(graph: &mut Graph, registry: &OpRegistry, folded: &mut Vec<PackedConstant>) -> Result<()> {
    while let Some(id) = find_eligible(graph, registry) {
        let node = graph.node(id).clone();
        let inputs: Vec<AttrValue> = node
            .inputs
            .iter()
            .map(|&v| graph.constant_value(v).cloned())
            .collect::<Option<_>>()
            .unwrap_or_else(|| unreachable!("eligibility requires constant inputs"));

        let packed = registry.evaluate(&node.kind, &inputs)?;
        let result_type = registry.entry(&node.kind).map(|e| e.result_type.clone());
        let out = node.outputs[0];
        let out_name = graph.value(out).name.clone();
        let pos = graph.position(id);
        let replacement =
            graph.insert_constant_at(pos, AttrValue::Packed(packed.clone()), out_name, result_type);
        graph.replace_all_uses_with(out, replacement);
        graph.destroy_node(id)?;
        tracing::debug!(kind = %node.kind, "folded prepack op");

        // inputs may repeat (shared clamp-bound constants): guard liveness
        for &v in &node.inputs {
            if graph.is_live_value(v)
                && graph.uses(v).is_empty()
                && !graph.outputs.contains(&v)
                && let Some(producer) = graph.producer_node(v)
                && graph.node(producer).is_constant()
            {
                graph.destroy_node(producer)?;
            }
        }
        folded.push(packed);
    }

    for &id in graph.order() {
        let node = graph.node(id);
        if registry.is_prepack(&node.kind) {
            tracing::debug!(kind = %node.kind, node = id.raw(), "prepack op with non-constant input skipped");
        }
    }
    graph.validate()?;
    Ok(())
}

fn find_eligible(graph: &Graph, registry: &OpRegistry) -> Option<NodeId> {
    graph.order().iter().copied().find(|&id| {
        let node = graph.node(id);
        registry.is_prepack(&node.kind)
            && node.outputs.len() == 1
            && node.inputs.iter().all(|&v| graph.constant_value(v).is_some())
    })
}
