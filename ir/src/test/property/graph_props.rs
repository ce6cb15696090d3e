//! Structural invariants of generated graphs, printing and matching.

use std::collections::HashSet;

use proptest::prelude::*;

use super::generators::arb_graph;
use crate::parse::{Pattern, parse_graph};
use crate::pattern::find_matches;

const PATTERNS: &[&str] = &[
    "graph(%x):
        %r = nn::relu(%x)
        return (%r)",
    "graph(%x):
        %a = nn::relu(%x)
        %r = nn::relu(%a)
        return (%r)",
    "graph(%x):
        %r = ns::add(%x, %x)
        return (%r)",
    "graph(%input, %weight, %bias):
        %r = nn::linear(%input, %weight, %bias)
        return (%r)",
];

proptest! {
    #[test]
    fn generated_graphs_validate(graph in arb_graph()) {
        prop_assert!(graph.validate().is_ok());
    }

    #[test]
    fn printing_and_reparsing_is_stable(graph in arb_graph()) {
        let printed = graph.to_string();
        let reparsed = parse_graph(&printed);
        prop_assert!(reparsed.is_ok(), "reparse failed on:\n{printed}");
        prop_assert_eq!(reparsed.unwrap().to_string(), printed);
    }

    #[test]
    fn matches_are_total_and_pairwise_node_disjoint(graph in arb_graph()) {
        for text in PATTERNS {
            let pattern = Pattern::parse(text).unwrap();
            let mut claimed = HashSet::new();
            for m in find_matches(&pattern, &graph) {
                prop_assert_eq!(m.nodes_map.len(), pattern.graph.order().len());
                for &target in m.nodes_map.values() {
                    prop_assert!(claimed.insert(target), "node matched twice");
                }
            }
        }
    }
}
