use crate::parse::{Pattern, parse_graph};
use crate::pattern::find_matches;

fn pattern(text: &str) -> Pattern {
    Pattern::parse(text).unwrap()
}

#[test]
fn single_node_match_binds_placeholders() {
    let pat = pattern(
        "graph(%input, %weight, %bias):
            %r = nn::linear(%input, %weight, %bias)
            return (%r)",
    );
    let g = parse_graph(
        "graph(%x, %w, %b):
            %y = nn::linear(%x, %w, %b)
            %z = nn::relu(%y)
            return (%z)",
    )
    .unwrap();

    let matches = find_matches(&pat, &g);
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.nodes_map.len(), 1);
    assert_eq!(m.bound(&pat.names, "input"), Some(g.inputs[0]));
    assert_eq!(m.bound(&pat.names, "weight"), Some(g.inputs[1]));
    assert_eq!(m.bound(&pat.names, "bias"), Some(g.inputs[2]));
}

#[test]
fn repeated_placeholder_requires_same_value() {
    let pat = pattern(
        "graph(%x):
            %a = ns::add(%x, %x)
            return (%a)",
    );

    let same = parse_graph(
        "graph(%x):
            %y = ns::mul(%x, %x)
            %a = ns::add(%y, %y)
            return (%a)",
    )
    .unwrap();
    assert_eq!(find_matches(&pat, &same).len(), 1);

    let different = parse_graph(
        "graph(%x):
            %y = ns::mul(%x, %x)
            %a = ns::add(%y, %x)
            return (%a)",
    )
    .unwrap();
    assert!(find_matches(&pat, &different).is_empty());
}

#[test]
fn operands_are_not_commutative() {
    let pat = pattern(
        "graph(%x):
            %r = ns::div(%x, 2.0)
            return (%r)",
    );

    let forward = parse_graph("graph(%x):\n %r = ns::div(%x, 2.0)\n return (%r)").unwrap();
    assert_eq!(find_matches(&pat, &forward).len(), 1);

    let swapped = parse_graph("graph(%x):\n %r = ns::div(2.0, %x)\n return (%r)").unwrap();
    assert!(find_matches(&pat, &swapped).is_empty());
}

#[test]
fn literal_constants_must_agree() {
    let pat = pattern(
        "graph(%x):
            %r = nn::hardtanh(%x, 0.0, 6.0)
            return (%r)",
    );

    let exact = parse_graph("graph(%x):\n %r = nn::hardtanh(%x, 0.0, 6.0)\n return (%r)").unwrap();
    assert_eq!(find_matches(&pat, &exact).len(), 1);

    let off = parse_graph("graph(%x):\n %r = nn::hardtanh(%x, -1.0, 6.0)\n return (%r)").unwrap();
    assert!(find_matches(&pat, &off).is_empty());
}

#[test]
fn interior_value_leak_rejects_match() {
    let pat = pattern(
        "graph(%a, %b, %c):
            %m = nn::matmul(%a, %b)
            %r = ns::add(%m, %c)
            return (%r)",
    );

    let clean = parse_graph(
        "graph(%a, %b, %c):
            %m = nn::matmul(%a, %b)
            %r = ns::add(%m, %c)
            return (%r)",
    )
    .unwrap();
    assert_eq!(find_matches(&pat, &clean).len(), 1);

    // %m escapes to a second consumer
    let leaky = parse_graph(
        "graph(%a, %b, %c):
            %m = nn::matmul(%a, %b)
            %r = ns::add(%m, %c)
            %z = nn::relu(%m)
            return (%r, %z)",
    )
    .unwrap();
    assert!(find_matches(&pat, &leaky).is_empty());

    // %m escapes as a graph output
    let returned = parse_graph(
        "graph(%a, %b, %c):
            %m = nn::matmul(%a, %b)
            %r = ns::add(%m, %c)
            return (%r, %m)",
    )
    .unwrap();
    assert!(find_matches(&pat, &returned).is_empty());
}

#[test]
fn n_occurrences_give_n_disjoint_matches() {
    let pat = pattern("graph(%x):\n %r = nn::relu(%x)\n return (%r)");
    let g = parse_graph(
        "graph(%a, %b, %c):
            %x = nn::relu(%a)
            %y = nn::relu(%b)
            %z = nn::relu(%c)
            return (%x, %y, %z)",
    )
    .unwrap();

    let matches = find_matches(&pat, &g);
    assert_eq!(matches.len(), 3);
    let anchors: std::collections::HashSet<_> = matches.iter().map(|m| m.anchor).collect();
    assert_eq!(anchors.len(), 3);
}

#[test]
fn overlapping_candidates_commit_first_in_order() {
    let pat = pattern(
        "graph(%x):
            %a = nn::relu(%x)
            %b = nn::relu(%a)
            return (%b)",
    );
    let g = parse_graph(
        "graph(%x):
            %p = nn::relu(%x)
            %q = nn::relu(%p)
            %r = nn::relu(%q)
            return (%r)",
    )
    .unwrap();

    // both two-node windows are structural matches; they share the middle
    // node, so only the earlier anchor is committed
    let matches = find_matches(&pat, &g);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].anchor, g.order()[1]);
}

#[test]
fn kind_and_arity_must_agree() {
    let pat = pattern("graph(%x, %y):\n %r = ns::add(%x, %y)\n return (%r)");

    let wrong_kind = parse_graph("graph(%x, %y):\n %r = ns::sub(%x, %y)\n return (%r)").unwrap();
    assert!(find_matches(&pat, &wrong_kind).is_empty());

    let wrong_arity =
        parse_graph("graph(%x, %y, %z):\n %r = ns::add(%x, %y, %z)\n return (%r)").unwrap();
    assert!(find_matches(&pat, &wrong_arity).is_empty());
}
