//! Arena-backed computation graph.
//!
//! Nodes and values live in append-only arenas addressed by stable ids;
//! destroyed slots become `None` and ids are never reused. An explicit
//! `order` list carries the topological schedule, so "insert before node X"
//! is an index operation rather than a pointer splice.

mod display;
mod node;

pub use node::{Node, NodeId, Producer, Use, Value, ValueId};

use smallvec::SmallVec;

use crate::error::{
    DanglingUseSnafu, MissingDefinitionSnafu, NodeStillUsedSnafu, Result, UseBeforeDefinitionSnafu,
    UseNotRecordedSnafu,
};
use crate::{AttrValue, Symbol, TypeAnn};

/// Kind of the node holding a compile-time literal.
pub const CONSTANT_KIND: &str = "prim::constant";
/// Attribute key under which a constant node stores its literal.
pub const VALUE_ATTR: &str = "value";

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    values: Vec<Option<Value>>,
    order: Vec<NodeId>,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: Option<String>, ty: Option<TypeAnn>) -> ValueId {
        let slot = self.inputs.len();
        let id = self.alloc_value(name, ty, Producer::GraphInput(slot));
        self.inputs.push(id);
        id
    }

    fn alloc_value(&mut self, name: Option<String>, ty: Option<TypeAnn>, producer: Producer) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Some(Value { name, ty, producer, uses: Vec::new() }));
        id
    }

    /// Insert a node at `pos` in the topological order. Outputs are added
    /// separately via [`Graph::add_output`].
    pub fn insert_node_at(&mut self, pos: usize, kind: Symbol, inputs: &[ValueId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for (operand, &v) in inputs.iter().enumerate() {
            self.value_mut(v).uses.push(Use { node: id, operand });
        }
        self.nodes.push(Some(Node {
            kind,
            inputs: SmallVec::from_slice(inputs),
            outputs: SmallVec::new(),
            attrs: Vec::new(),
        }));
        self.order.insert(pos, id);
        id
    }

    pub fn append_node(&mut self, kind: Symbol, inputs: &[ValueId]) -> NodeId {
        self.insert_node_at(self.order.len(), kind, inputs)
    }

    pub fn add_output(&mut self, node: NodeId, name: Option<String>, ty: Option<TypeAnn>) -> ValueId {
        let index = self.node(node).outputs.len();
        let id = self.alloc_value(name, ty, Producer::Node { node, index });
        self.node_mut(node).outputs.push(id);
        id
    }

    /// Insert a `prim::constant` at `pos` and return its output value.
    /// The output type defaults to the literal's own type.
    pub fn insert_constant_at(
        &mut self,
        pos: usize,
        value: AttrValue,
        name: Option<String>,
        ty: Option<TypeAnn>,
    ) -> ValueId {
        let ty = ty.or_else(|| Some(value.type_ann()));
        let node = self.insert_node_at(pos, Symbol::new(CONSTANT_KIND), &[]);
        self.set_attr(node, Symbol::new(VALUE_ATTR), value);
        self.add_output(node, name, ty)
    }

    pub fn append_constant(&mut self, value: AttrValue, name: Option<String>) -> ValueId {
        self.insert_constant_at(self.order.len(), value, name, None)
    }

    pub fn set_attr(&mut self, node: NodeId, key: Symbol, value: AttrValue) {
        let attrs = &mut self.node_mut(node).attrs;
        if let Some(slot) = attrs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            attrs.push((key, value));
        }
    }

    pub fn set_kind(&mut self, node: NodeId, kind: Symbol) {
        self.node_mut(node).kind = kind;
    }

    /// Panics when `id` points at a destroyed node; callers hold only live ids.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.index()].as_ref().unwrap_or_else(|| panic!("stale node id {}", id.raw()))
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.index()].as_mut().unwrap_or_else(|| panic!("stale node id {}", id.raw()))
    }

    pub fn value(&self, id: ValueId) -> &Value {
        self.values[id.index()].as_ref().unwrap_or_else(|| panic!("stale value id {}", id.raw()))
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut Value {
        self.values[id.index()].as_mut().unwrap_or_else(|| panic!("stale value id {}", id.raw()))
    }

    pub fn is_live_node(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(Option::is_some)
    }

    pub fn is_live_value(&self, id: ValueId) -> bool {
        self.values.get(id.index()).is_some_and(Option::is_some)
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Position of a live node in the topological order.
    pub fn position(&self, id: NodeId) -> usize {
        self.order
            .iter()
            .position(|&n| n == id)
            .unwrap_or_else(|| panic!("node {} not in order", id.raw()))
    }

    pub fn uses(&self, v: ValueId) -> &[Use] {
        &self.value(v).uses
    }

    pub fn producer_node(&self, v: ValueId) -> Option<NodeId> {
        match self.value(v).producer {
            Producer::Node { node, .. } => Some(node),
            Producer::GraphInput(_) => None,
        }
    }

    /// The literal a value carries, when its producer is a constant node.
    pub fn constant_value(&self, v: ValueId) -> Option<&AttrValue> {
        let node = self.producer_node(v)?;
        let node = self.node(node);
        if node.is_constant() { node.attr(VALUE_ATTR) } else { None }
    }

    /// Point one operand of `node` at `new`, maintaining both use lists.
    pub fn replace_input(&mut self, node: NodeId, operand: usize, new: ValueId) {
        let old = self.node(node).inputs[operand];
        if old == new {
            return;
        }
        self.value_mut(old).uses.retain(|u| !(u.node == node && u.operand == operand));
        self.node_mut(node).inputs[operand] = new;
        self.value_mut(new).uses.push(Use { node, operand });
    }

    /// Redirect every consumer of `old` (including graph outputs) to `new`.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        let uses = std::mem::take(&mut self.value_mut(old).uses);
        for u in &uses {
            self.node_mut(u.node).inputs[u.operand] = new;
        }
        self.value_mut(new).uses.extend(uses);
        for out in &mut self.outputs {
            if *out == old {
                *out = new;
            }
        }
    }

    /// Remove a node whose outputs have no remaining consumers.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<()> {
        let outputs = self.node(id).outputs.clone();
        for &out in &outputs {
            let uses = self.value(out).uses.len();
            let returned = self.outputs.contains(&out);
            snafu::ensure!(
                uses == 0 && !returned,
                NodeStillUsedSnafu { node: id.raw(), value: out.raw(), uses: uses + returned as usize }
            );
        }
        let inputs = self.node(id).inputs.clone();
        for &v in &inputs {
            self.value_mut(v).uses.retain(|u| u.node != id);
        }
        for &out in &outputs {
            self.values[out.index()] = None;
        }
        self.order.retain(|&n| n != id);
        self.nodes[id.index()] = None;
        Ok(())
    }

    /// Check structural consistency: live use lists, single definitions,
    /// and definition-before-use along the topological order.
    pub fn validate(&self) -> Result<()> {
        let def_pos = |v: ValueId| -> Option<usize> {
            match self.values[v.index()].as_ref()?.producer {
                Producer::GraphInput(_) => Some(0),
                Producer::Node { node, .. } => {
                    self.order.iter().position(|&n| n == node).map(|p| p + 1)
                }
            }
        };

        for (i, &id) in self.order.iter().enumerate() {
            let node = self.node(id);
            for (operand, &v) in node.inputs.iter().enumerate() {
                let Some(value) = self.values.get(v.index()).and_then(Option::as_ref) else {
                    return MissingDefinitionSnafu { value: v.raw() }.fail();
                };
                snafu::ensure!(
                    value.uses.iter().any(|u| u.node == id && u.operand == operand),
                    UseNotRecordedSnafu { node: id.raw(), operand, value: v.raw() }
                );
                let Some(def) = def_pos(v) else {
                    return MissingDefinitionSnafu { value: v.raw() }.fail();
                };
                snafu::ensure!(def <= i, UseBeforeDefinitionSnafu { node: id.raw(), value: v.raw() });
            }
            for (index, &out) in node.outputs.iter().enumerate() {
                let Some(value) = self.values.get(out.index()).and_then(Option::as_ref) else {
                    return MissingDefinitionSnafu { value: out.raw() }.fail();
                };
                snafu::ensure!(
                    value.producer == (Producer::Node { node: id, index }),
                    MissingDefinitionSnafu { value: out.raw() }
                );
            }
        }

        for (idx, slot) in self.values.iter().enumerate() {
            let Some(value) = slot else { continue };
            for u in &value.uses {
                let live = self.is_live_node(u.node)
                    && self.node(u.node).inputs.get(u.operand) == Some(&ValueId(idx as u32));
                snafu::ensure!(live, DanglingUseSnafu { value: idx as u32, node: u.node.raw() });
            }
            if let Producer::Node { node, index } = value.producer {
                let produced = self.is_live_node(node)
                    && self.node(node).outputs.get(index) == Some(&ValueId(idx as u32))
                    && self.order.contains(&node);
                snafu::ensure!(produced, MissingDefinitionSnafu { value: idx as u32 });
            }
        }

        for &out in &self.outputs {
            snafu::ensure!(
                self.values.get(out.index()).is_some_and(Option::is_some),
                MissingDefinitionSnafu { value: out.raw() }
            );
        }
        Ok(())
    }
}
