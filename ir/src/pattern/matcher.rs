//! Anchored subgraph matching.
//!
//! A pattern is matched against a target graph by trying every target node
//! as the anchor (the producer of the pattern's first return value) and
//! walking producers in reverse topological order. Matching is structural
//! and deterministic: kinds, arities and attribute literals must agree
//! position by position; operands are never reordered.

use std::collections::{HashMap, HashSet};

use crate::graph::{Graph, NodeId, Producer, ValueId};
use crate::parse::Pattern;

/// One committed match: pattern ids on the left, target ids on the right.
#[derive(Debug, Clone)]
pub struct Match {
    /// Target node matched to the pattern's return-producing node.
    pub anchor: NodeId,
    pub nodes_map: HashMap<NodeId, NodeId>,
    pub values_map: HashMap<ValueId, ValueId>,
}

impl Match {
    /// Target value bound to a pattern name, given the pattern's name table.
    pub fn bound(&self, names: &HashMap<String, ValueId>, name: &str) -> Option<ValueId> {
        self.values_map.get(names.get(name)?).copied()
    }
}

/// All pairwise node-disjoint matches of `pattern` in `target`, committed
/// first-found in topological anchor order.
pub fn find_matches(pattern: &Pattern, target: &Graph) -> Vec<Match> {
    let Some(&first_out) = pattern.graph.outputs.first() else {
        return Vec::new();
    };
    let Some(anchor) = pattern.graph.producer_node(first_out) else {
        return Vec::new();
    };
    let anchor_kind = pattern.graph.node(anchor).kind.clone();

    let mut claimed: HashSet<NodeId> = HashSet::new();
    let mut matches = Vec::new();
    for &candidate in target.order() {
        if target.node(candidate).kind != anchor_kind {
            continue;
        }
        let mut state = MatchState::new(&pattern.graph, target);
        if !state.try_match_node(anchor, candidate) {
            tracing::trace!(candidate = candidate.raw(), "anchor candidate rejected");
            continue;
        }
        if !state.is_total() || !state.no_interior_leak() {
            tracing::trace!(candidate = candidate.raw(), "structural match rejected");
            continue;
        }
        if state.used_targets.iter().any(|n| claimed.contains(n)) {
            tracing::trace!(candidate = candidate.raw(), "overlaps committed match, skipped");
            continue;
        }
        claimed.extend(state.used_targets.iter().copied());
        tracing::debug!(anchor = candidate.raw(), nodes = state.nodes_map.len(), "match found");
        matches.push(Match {
            anchor: candidate,
            nodes_map: state.nodes_map,
            values_map: state.values_map,
        });
    }
    matches
}

struct MatchState<'a> {
    pattern: &'a Graph,
    target: &'a Graph,
    nodes_map: HashMap<NodeId, NodeId>,
    values_map: HashMap<ValueId, ValueId>,
    used_targets: HashSet<NodeId>,
}

impl<'a> MatchState<'a> {
    fn new(pattern: &'a Graph, target: &'a Graph) -> Self {
        Self {
            pattern,
            target,
            nodes_map: HashMap::new(),
            values_map: HashMap::new(),
            used_targets: HashSet::new(),
        }
    }

    fn bind_value(&mut self, pv: ValueId, tv: ValueId) -> bool {
        match self.values_map.get(&pv) {
            Some(&bound) => bound == tv,
            None => {
                self.values_map.insert(pv, tv);
                true
            }
        }
    }

    fn try_match_value(&mut self, pv: ValueId, tv: ValueId) -> bool {
        if let Some(&bound) = self.values_map.get(&pv) {
            return bound == tv;
        }
        match self.pattern.value(pv).producer {
            // free placeholder: binds to anything, consistently
            Producer::GraphInput(_) => self.bind_value(pv, tv),
            Producer::Node { node: pn, index } => {
                let Producer::Node { node: tn, index: ti } = self.target.value(tv).producer else {
                    return false;
                };
                index == ti && self.try_match_node(pn, tn) && self.bind_value(pv, tv)
            }
        }
    }

    fn try_match_node(&mut self, pn: NodeId, tn: NodeId) -> bool {
        if let Some(&bound) = self.nodes_map.get(&pn) {
            return bound == tn;
        }
        if self.used_targets.contains(&tn) {
            return false;
        }
        let p = self.pattern.node(pn);
        let t = self.target.node(tn);
        if p.kind != t.kind
            || p.inputs.len() != t.inputs.len()
            || p.outputs.len() != t.outputs.len()
        {
            return false;
        }
        for (key, value) in &p.attrs {
            if t.attr(key.as_str()) != Some(value) {
                return false;
            }
        }
        self.nodes_map.insert(pn, tn);
        self.used_targets.insert(tn);
        for (&po, &to) in p.outputs.iter().zip(&t.outputs) {
            if !self.bind_value(po, to) {
                return false;
            }
        }
        for (&pi, &ti) in p.inputs.iter().zip(&t.inputs) {
            if !self.try_match_value(pi, ti) {
                return false;
            }
        }
        true
    }

    /// Every pattern node must be mapped; disconnected pattern pieces the
    /// anchor walk never reached mean the candidate is not a match.
    fn is_total(&self) -> bool {
        self.pattern.order().iter().all(|n| self.nodes_map.contains_key(n))
    }

    /// Interior pattern values (node-produced, not returned) must not be
    /// visible outside the matched subgraph.
    fn no_interior_leak(&self) -> bool {
        for (&pv, &tv) in &self.values_map {
            let interior = matches!(self.pattern.value(pv).producer, Producer::Node { .. })
                && !self.pattern.outputs.contains(&pv);
            if !interior {
                continue;
            }
            if self.target.outputs.contains(&tv) {
                return false;
            }
            if self.target.uses(tv).iter().any(|u| !self.used_targets.contains(&u.node)) {
                return false;
            }
        }
        true
    }
}
