//! Rewrite sequences over random graphs keep the graph consistent.

use proptest::prelude::*;

use super::generators::arb_graph;
use crate::rewrite::SubgraphRewriter;

const LINEAR_SPLIT: (&str, &str) = (
    "graph(%input, %weight, %bias):
        %r = nn::linear(%input, %weight, %bias)
        return (%r)",
    "graph(%input, %weight, %bias):
        %packed = vk::linear_prepack(%weight, %bias)
        %r = vk::linear_run(%input, %packed)
        return (%r)",
);

/// Fusion, split and activation collapse registered together; fusion
/// comes first so the split sees fused nodes within the same run.
fn pipeline_rewriter() -> SubgraphRewriter {
    let mut rewriter = SubgraphRewriter::new();
    rewriter
        .register_rewrite_pattern(
            "graph(%input, %weight, %bias):
                %wt = nn::t(%weight)
                %mm = nn::matmul(%input, %wt)
                %res = ns::add(%mm, %bias)
                return (%res)",
            "graph(%input, %weight, %bias):
                %res = nn::linear(%input, %weight, %bias)
                return (%res)",
            vec![],
        )
        .unwrap();
    rewriter.register_rewrite_pattern(LINEAR_SPLIT.0, LINEAR_SPLIT.1, vec![]).unwrap();
    rewriter
        .register_rewrite_pattern(
            "graph(%x):
                %a = nn::relu(%x)
                %r = nn::relu(%a)
                return (%r)",
            "graph(%x):
                %r = nn::relu(%x)
                return (%r)",
            vec![],
        )
        .unwrap();
    rewriter
}

proptest! {
    #[test]
    fn rewrite_sequences_keep_the_graph_consistent(graph in arb_graph()) {
        let mut graph = graph;
        let outputs = graph.outputs.len();
        let rewriter = pipeline_rewriter();

        rewriter.run_on_graph(&mut graph).unwrap();
        prop_assert!(graph.validate().is_ok());
        prop_assert_eq!(graph.outputs.len(), outputs);

        // a second pass over the already-rewritten graph must stay clean
        rewriter.run_on_graph(&mut graph).unwrap();
        prop_assert!(graph.validate().is_ok());
        prop_assert_eq!(graph.outputs.len(), outputs);
    }

    #[test]
    fn prepack_split_reaches_a_fixpoint(graph in arb_graph()) {
        let mut graph = graph;
        let mut rewriter = SubgraphRewriter::new();
        rewriter.register_rewrite_pattern(LINEAR_SPLIT.0, LINEAR_SPLIT.1, vec![]).unwrap();

        rewriter.run_on_graph(&mut graph).unwrap();
        let survived = graph.order().iter().any(|&n| graph.node(n).kind == "nn::linear");
        prop_assert!(!survived, "a linear survived the split");

        let printed = graph.to_string();
        let changed = rewriter.run_on_graph(&mut graph).unwrap();
        prop_assert!(!changed);
        prop_assert_eq!(graph.to_string(), printed);
    }
}
