use splice_ir::{AttrValue, parse_graph};

use super::{kinds, linear_bias, linear_weight};
use crate::freeze::freeze;
use crate::module::Module;

#[test]
fn get_attr_becomes_constant() {
    let mut m = Module::new("m");
    m.register_parameter("weight", linear_weight());
    m.register_parameter("bias", linear_bias());
    m.add_method(
        "forward",
        parse_graph(
            "graph(%x):
                %weight = prim::get_attr[name=\"weight\"]()
                %bias = prim::get_attr[name=\"bias\"]()
                %r = nn::linear(%x, %weight, %bias)
                return (%r)",
        )
        .unwrap(),
    );

    freeze(&mut m, &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    assert_eq!(kinds(g), vec!["prim::constant", "prim::constant", "nn::linear"]);
    let linear = g.order()[2];
    assert_eq!(g.constant_value(g.node(linear).inputs[1]), Some(&linear_weight()));
    assert_eq!(g.constant_value(g.node(linear).inputs[2]), Some(&linear_bias()));
    // freezing reads parameters, it does not consume them
    assert_eq!(m.parameter("weight"), Some(&linear_weight()));
}

#[test]
fn transpose_over_constant_is_propagated() {
    let mut m = Module::new("m");
    m.register_parameter("weight", linear_weight());
    m.add_method(
        "forward",
        parse_graph(
            "graph(%x):
                %weight = prim::get_attr[name=\"weight\"]()
                %wt = nn::t(%weight)
                %r = nn::matmul(%x, %wt)
                return (%r)",
        )
        .unwrap(),
    );

    freeze(&mut m, &[]).unwrap();

    let g = &m.get_method("forward").unwrap().graph;
    assert_eq!(kinds(g), vec!["prim::constant", "nn::matmul"]);
    let matmul = g.order()[1];
    let wt = g.constant_value(g.node(matmul).inputs[1]).and_then(AttrValue::as_tensor).unwrap();
    assert_eq!(wt.shape.as_slice(), &[3, 2]);
}

#[test]
fn unknown_attribute_is_left_alone() {
    let mut m = Module::new("m");
    m.add_method(
        "forward",
        parse_graph(
            "graph(%x):
                %w = prim::get_attr[name=\"buffer\"]()
                %r = nn::matmul(%x, %w)
                return (%r)",
        )
        .unwrap(),
    );

    freeze(&mut m, &[]).unwrap();
    assert_eq!(kinds(&m.get_method("forward").unwrap().graph), vec!["prim::get_attr", "nn::matmul"]);
}

#[test]
fn preserved_methods_are_not_frozen() {
    let mut m = Module::new("m");
    m.register_parameter("weight", linear_weight());
    m.add_method(
        "calibrate",
        parse_graph(
            "graph(%x):
                %weight = prim::get_attr[name=\"weight\"]()
                %r = nn::matmul(%x, %weight)
                return (%r)",
        )
        .unwrap(),
    );

    freeze(&mut m, &["calibrate"]).unwrap();
    assert_eq!(
        kinds(&m.get_method("calibrate").unwrap().graph),
        vec!["prim::get_attr", "nn::matmul"]
    );
}
