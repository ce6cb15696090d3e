use splice_ir::parse_graph;

use super::kinds;
use crate::cleanup::remove_mutation;
use crate::fuse::fuse_decomposed;
use crate::module::Module;
use crate::prepack::insert_prepack_ops;

fn single_method(graph_text: &str) -> Module {
    let mut m = Module::new("m");
    m.add_method("forward", parse_graph(graph_text).unwrap());
    m
}

#[test]
fn addmm_with_identity_scaling_fuses() {
    let mut m = single_method(
        "graph(%input, %weight, %bias):
            %wt = nn::t(%weight)
            %r = nn::addmm(%bias, %input, %wt, 1, 1)
            return (%r)",
    );
    fuse_decomposed(&mut m, &[]).unwrap();
    assert!(kinds(&m.get_method("forward").unwrap().graph).contains(&"nn::linear".to_string()));
}

#[test]
fn addmm_with_scaling_is_left_alone() {
    let mut m = single_method(
        "graph(%input, %weight, %bias):
            %wt = nn::t(%weight)
            %r = nn::addmm(%bias, %input, %wt, 2, 1)
            return (%r)",
    );
    fuse_decomposed(&mut m, &[]).unwrap();
    assert!(kinds(&m.get_method("forward").unwrap().graph).contains(&"nn::addmm".to_string()));
}

#[test]
fn conv_transpose_gets_its_own_prepack_kind() {
    let mut m = single_method(
        "graph(%input, %weight, %bias):
            %r = nn::conv_transpose2d(%input, %weight, %bias, [2, 2], [1, 1], [0, 0], 1, [1, 1])
            return (%r)",
    );
    insert_prepack_ops(&mut m, &[]).unwrap();
    let k = kinds(&m.get_method("forward").unwrap().graph);
    assert!(k.contains(&"vk::conv2d_transpose_clamp_prepack".to_string()));
    assert!(k.contains(&"vk::conv2d_transpose_clamp_run".to_string()));
}

#[test]
fn inplace_hardtanh_is_rewritten_to_functional() {
    let mut m = single_method(
        "graph(%x):
            %r = nn::hardtanh_(%x, 0.0, 6.0)
            return (%r)",
    );
    remove_mutation(&mut m, &[]).unwrap();
    assert!(kinds(&m.get_method("forward").unwrap().graph).contains(&"nn::hardtanh".to_string()));
}

#[test]
fn shared_none_constant_feeds_both_bound_slots() {
    let mut m = single_method(
        "graph(%input, %weight, %bias):
            %r = nn::conv2d(%input, %weight, %bias, [1, 1], [0, 0], [1, 1], 1)
            return (%r)",
    );
    insert_prepack_ops(&mut m, &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    let prepack = g
        .order()
        .iter()
        .copied()
        .find(|&n| g.node(n).kind == "vk::conv2d_clamp_prepack")
        .unwrap();
    let inputs = &g.node(prepack).inputs;
    // the two clamp slots reference one shared None constant
    assert_eq!(inputs[6], inputs[7]);
    assert_eq!(g.constant_value(inputs[6]), Some(&splice_ir::AttrValue::None));
}
