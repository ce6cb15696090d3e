use splice_ir::{AttrValue, parse_graph};

use super::{kinds, linear_weight};
use crate::fold::fold_prepack_ops;
use crate::module::Module;
use crate::vk::{self, LinearPackedContext};

fn module_with(graph_text: &str) -> Module {
    let mut m = Module::new("m");
    m.register_parameter("weight", linear_weight());
    m.add_method("forward", parse_graph(graph_text).unwrap());
    m
}

#[test]
fn eligible_prepack_is_folded_to_packed_constant() {
    // weight already frozen into a constant
    let mut m = Module::new("m");
    let mut g = parse_graph(
        "graph(%x):
            %none : None = prim::constant[value=None]()
            %packed = vk::linear_prepack(%none, %none)
            %r = vk::linear_run(%x, %packed)
            return (%r)",
    )
    .unwrap();
    // swap the weight slot to a real tensor constant
    let prepack = g.order()[1];
    let weight = g.insert_constant_at(0, linear_weight(), Some("weight".into()), None);
    g.replace_input(prepack, 0, weight);
    g.validate().unwrap();
    m.add_method("forward", g);

    fold_prepack_ops(&mut m, &vk::registry(), "prepack_folding", &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    assert_eq!(kinds(g), vec!["prim::constant", "vk::linear_run"]);
    let packed = g.constant_value(g.node(g.order()[1]).inputs[1]).unwrap();
    let ctx = packed.as_packed().unwrap().downcast_ref::<LinearPackedContext>().unwrap();
    assert_eq!(ctx.weight.shape.as_slice(), &[3, 2]);
    assert!(ctx.bias.is_none());

    // the packed result is mirrored as a module attribute
    let attr = m.attribute("prepack_folding_0").unwrap();
    assert!(matches!(attr, AttrValue::Packed(_)));
}

#[test]
fn non_constant_input_skips_the_node() {
    let mut m = module_with(
        "graph(%x, %weight):
            %none : None = prim::constant[value=None]()
            %packed = vk::linear_prepack(%weight, %none)
            %r = vk::linear_run(%x, %packed)
            return (%r)",
    );

    fold_prepack_ops(&mut m, &vk::registry(), "prepack_folding", &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    assert!(kinds(g).contains(&"vk::linear_prepack".to_string()));
    assert!(m.attribute("prepack_folding_0").is_none());
}

#[test]
fn node_computed_weight_skips_the_node() {
    // the weight slot is fed by another node's output, not a constant
    let mut m = module_with(
        "graph(%x, %w):
            %wt = nn::t(%w)
            %none : None = prim::constant[value=None]()
            %packed = vk::linear_prepack(%wt, %none)
            %r = vk::linear_run(%x, %packed)
            return (%r)",
    );

    fold_prepack_ops(&mut m, &vk::registry(), "prepack_folding", &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    assert!(kinds(g).contains(&"nn::t".to_string()));
    assert!(kinds(g).contains(&"vk::linear_prepack".to_string()));
    assert!(m.attribute("prepack_folding_0").is_none());
}

#[test]
fn run_ops_are_never_folded() {
    // a run op over two constants must not be evaluated
    let mut m = Module::new("m");
    m.add_method(
        "forward",
        parse_graph(
            "graph():
                %a : None = prim::constant[value=None]()
                %r = vk::linear_run(%a, %a)
                return (%r)",
        )
        .unwrap(),
    );

    fold_prepack_ops(&mut m, &vk::registry(), "prepack_folding", &[]).unwrap();
    let g = &m.get_method("forward").unwrap().graph;
    assert!(kinds(g).contains(&"vk::linear_run".to_string()));
}

#[test]
fn folding_recurses_into_children() {
    let mut child = Module::new("child");
    let mut g = parse_graph(
        "graph(%x):
            %none : None = prim::constant[value=None]()
            %packed = vk::linear_prepack(%none, %none)
            %r = vk::linear_run(%x, %packed)
            return (%r)",
    )
    .unwrap();
    let prepack = g.order()[1];
    let weight = g.insert_constant_at(0, linear_weight(), Some("weight".into()), None);
    g.replace_input(prepack, 0, weight);
    child.add_method("forward", g);

    let mut root = Module::new("root");
    root.add_child(child);

    fold_prepack_ops(&mut root, &vk::registry(), "prepack_folding", &[]).unwrap();

    assert!(root.attribute("prepack_folding_0").is_none());
    let child = &root.children()[0];
    assert!(matches!(child.attribute("prepack_folding_0"), Some(AttrValue::Packed(_))));
}
