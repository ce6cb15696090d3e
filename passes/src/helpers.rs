use splice_ir::{AttrValue, Graph, ValueId};

/// The callee name a `prim::call_function` target carries, when its
/// function operand is a string constant.
pub fn func_name(graph: &Graph, v: ValueId) -> Option<&str> {
    graph.constant_value(v)?.as_str()
}

pub fn is_constant(graph: &Graph, v: ValueId) -> bool {
    graph.constant_value(v).is_some()
}

pub fn is_constant_false(graph: &Graph, v: ValueId) -> bool {
    graph.constant_value(v) == Some(&AttrValue::Bool(false))
}
