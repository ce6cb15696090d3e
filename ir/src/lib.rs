//! Computation-graph IR with pattern-based subgraph rewriting.
//!
//! # Module Organization
//!
//! - [`graph`] - arena-backed graph, values, use lists, validation
//! - [`parse`] - textual DSL parser producing [`Pattern`]s and graphs
//! - [`pattern`] - anchored subgraph matcher
//! - [`rewrite`] - the [`SubgraphRewriter`] splicing engine
//! - [`types`] - constant literals ([`AttrValue`]) and type annotations
//! - [`symbol`] - namespaced operator names
//! - [`error`] - error types and result handling

pub mod error;
pub mod graph;
pub mod parse;
pub mod pattern;
pub mod rewrite;
pub mod symbol;
pub mod types;

#[cfg(test)]
mod test;

pub use error::{Error, Result};
pub use graph::{CONSTANT_KIND, Graph, Node, NodeId, Producer, Use, VALUE_ATTR, Value, ValueId};
pub use parse::{Pattern, parse_graph};
pub use pattern::{Match, find_matches};
pub use rewrite::{SubgraphRewriter, ValueMapping};
pub use symbol::Symbol;
pub use types::{AttrValue, PackedConstant, TensorData, TypeAnn};
