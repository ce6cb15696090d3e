use smallvec::SmallVec;

use crate::{AttrValue, Symbol, TypeAnn};

/// Stable handle into a graph's node arena. Never reused within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Stable handle into a graph's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Where a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Producer {
    /// The n-th graph input.
    GraphInput(usize),
    /// The `index`-th output of `node`.
    Node { node: NodeId, index: usize },
}

/// One consuming edge: `node` reads the value as its `operand`-th input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    pub node: NodeId,
    pub operand: usize,
}

#[derive(Debug, Clone)]
pub struct Value {
    pub name: Option<String>,
    pub ty: Option<TypeAnn>,
    pub producer: Producer,
    pub uses: Vec<Use>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Symbol,
    pub inputs: SmallVec<[ValueId; 4]>,
    pub outputs: SmallVec<[ValueId; 2]>,
    pub attrs: Vec<(Symbol, AttrValue)>,
}

impl Node {
    pub fn is_constant(&self) -> bool {
        self.kind == super::CONSTANT_KIND
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k == &key).map(|(_, v)| v)
    }
}
