//! Pattern-driven subgraph replacement.
//!
//! A rewriter holds parsed (before, after) rule pairs. Running it on a
//! graph repeats a scan-apply cycle until no rule matches: find all
//! disjoint matches of the before pattern, splice in the after pattern at
//! the first match the filter accepts, then re-scan. Each splice is atomic
//! and the graph is re-validated afterwards, so a failed apply surfaces as
//! a fatal inconsistency instead of a half-rewritten graph.

use std::collections::{HashMap, HashSet};

use crate::error::{OutputArityMismatchSnafu, Result, UnboundPatternNameSnafu};
use crate::graph::{Graph, NodeId, Use, ValueId};
use crate::parse::Pattern;
use crate::pattern::{Match, find_matches};

/// Pairs of (before-name, after-name): external uses of the before value
/// are inherited by the after value, on top of positional output rewiring.
pub type ValueMapping = Vec<(String, String)>;

/// Scan guard. A rule that keeps matching its own output would loop; the
/// graph is user input but the rules are ours, so this is a programmer
/// error and panics like other internal limits.
const MAX_ITERATIONS: usize = 1000;

struct RewriteRule {
    before: Pattern,
    after: Pattern,
    value_mapping: ValueMapping,
}

#[derive(Default)]
pub struct SubgraphRewriter {
    rules: Vec<RewriteRule>,
}

impl SubgraphRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a rule pair. Every after-pattern input and every
    /// mapping entry must resolve to a declared pattern name; the two
    /// patterns must return the same number of values.
    pub fn register_rewrite_pattern(
        &mut self,
        before: &str,
        after: &str,
        value_mapping: ValueMapping,
    ) -> Result<()> {
        let before = Pattern::parse(before)?;
        let after = Pattern::parse(after)?;

        for &input in &after.graph.inputs {
            let name = after.graph.value(input).name.clone().unwrap_or_default();
            snafu::ensure!(before.names.contains_key(&name), UnboundPatternNameSnafu { name });
        }
        snafu::ensure!(
            before.graph.outputs.len() == after.graph.outputs.len(),
            OutputArityMismatchSnafu {
                before: before.graph.outputs.len(),
                after: after.graph.outputs.len(),
            }
        );
        for (b, a) in &value_mapping {
            snafu::ensure!(before.names.contains_key(b), UnboundPatternNameSnafu { name: b.clone() });
            snafu::ensure!(after.names.contains_key(a), UnboundPatternNameSnafu { name: a.clone() });
        }

        self.rules.push(RewriteRule { before, after, value_mapping });
        Ok(())
    }

    /// Apply every rule to fixpoint. Returns whether the graph changed.
    pub fn run_on_graph(&self, graph: &mut Graph) -> Result<bool> {
        self.run_on_graph_filtered(graph, |_, _, _| true)
    }

    /// Like [`run_on_graph`](Self::run_on_graph), but each candidate match
    /// must pass `filter` before it is spliced. The filter sees the match,
    /// the before pattern's name table and the target graph; rejection is
    /// local and the scan moves on to the next candidate.
    pub fn run_on_graph_filtered<F>(&self, graph: &mut Graph, filter: F) -> Result<bool>
    where
        F: Fn(&Match, &HashMap<String, ValueId>, &Graph) -> bool,
    {
        let mut changed = false;
        for rule in &self.rules {
            for iteration in 0usize.. {
                assert!(iteration < MAX_ITERATIONS, "rewrite did not converge after {MAX_ITERATIONS} iterations");
                let accepted = find_matches(&rule.before, graph)
                    .into_iter()
                    .find(|m| filter(m, &rule.before.names, graph));
                let Some(m) = accepted else { break };
                tracing::debug!(anchor = m.anchor.raw(), iteration, "applying rewrite");
                apply(graph, rule, &m)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}

/// Splice the after pattern over one match. New nodes are instantiated
/// immediately before the matched anchor, external uses are rewired, then
/// the matched nodes are destroyed in reverse topological order.
fn apply(graph: &mut Graph, rule: &RewriteRule, m: &Match) -> Result<()> {
    let after = &rule.after.graph;

    // after-side value -> target value, seeded through the shared names
    let mut map: HashMap<ValueId, ValueId> = HashMap::new();
    for &av in &after.inputs {
        // registration checked the name exists on both sides
        let name = after.value(av).name.as_deref().unwrap_or_default();
        let bv = rule.before.names[name];
        map.insert(av, m.values_map[&bv]);
    }

    let mut pos = graph.position(m.anchor);
    for &an in after.order() {
        let node = after.node(an).clone();
        let inputs: Vec<ValueId> = node.inputs.iter().map(|v| map[v]).collect();
        let new = graph.insert_node_at(pos, node.kind.clone(), &inputs);
        pos += 1;
        for (key, value) in node.attrs {
            graph.set_attr(new, key, value);
        }
        for &ao in &node.outputs {
            let out = after.value(ao);
            let id = graph.add_output(new, out.name.clone(), out.ty.clone());
            map.insert(ao, id);
        }
    }

    let mut rewires: Vec<(ValueId, ValueId)> = rule
        .before
        .graph
        .outputs
        .iter()
        .zip(&after.outputs)
        .map(|(bo, ao)| (m.values_map[bo], map[ao]))
        .collect();
    for (b, a) in &rule.value_mapping {
        rewires.push((m.values_map[&rule.before.names[b]], map[&rule.after.names[a]]));
    }

    let matched: HashSet<NodeId> = m.nodes_map.values().copied().collect();
    for (old, new) in rewires {
        if old == new {
            continue;
        }
        let external: Vec<Use> = graph
            .uses(old)
            .iter()
            .copied()
            .filter(|u| !matched.contains(&u.node))
            .collect();
        for u in external {
            graph.replace_input(u.node, u.operand, new);
        }
        for i in 0..graph.outputs.len() {
            if graph.outputs[i] == old {
                graph.outputs[i] = new;
            }
        }
    }

    let mut doomed: Vec<NodeId> = matched.into_iter().collect();
    doomed.sort_by_key(|&n| graph.position(n));
    for &n in doomed.iter().rev() {
        graph.destroy_node(n)?;
    }
    graph.validate()
}
