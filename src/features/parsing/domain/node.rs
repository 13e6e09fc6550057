//! Graph node
//!
//! spec.md §3: an immutable record identifying one semantic entity emitted
//! while translating a source file — a module, a class, a function, a
//! variable, a call site, a literal, a control-flow marker, and so on.

use crate::shared::models::{Attribute, Metadata, Span};
use crate::shared::utils::IdAllocator;

use super::scope::ScopeId;

/// Node type, exactly the closed set spec.md §3 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ModuleScope,
    Class,
    Function,
    Variable,
    Parameter,
    FieldRef,
    Import,
    Call,
    Literal,
    Block,
    Loop,
    Conditional,
    Return,
    Throw,
    TypeRef,
}

/// Synthetic names used for nodes with no source-level identifier
/// (spec.md §3/§4.3).
pub mod synthetic_name {
    pub const LAMBDA: &str = "__lambda__";
    pub const COND: &str = "__cond__";
    pub const TERNARY: &str = "__ternary__";
    pub const ITER: &str = "__iter__";
}

/// An emitted node. Two nodes are equal iff their `id` is equal — ids are
/// globally unique within a run (spec.md §3 invariant).
#[derive(Debug, Clone)]
pub struct Node {
    pub id: u64,
    pub kind: NodeKind,
    pub name: String,
    pub range: Span,
    pub file_id: u32,
    pub version: u32,
    pub scope_id: ScopeId,
    pub metadata: Metadata,
}

impl PartialEq for Node {
    /// Two nodes are equal iff their `id` is equal (spec.md §3 invariant).
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Node {
    pub fn new(
        id: u64,
        kind: NodeKind,
        name: impl Into<String>,
        range: Span,
        file_id: u32,
        version: u32,
        scope_id: ScopeId,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            range,
            file_id,
            version,
            scope_id,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Attribute>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn is_constructor(&self) -> bool {
        self.metadata
            .get("is_constructor")
            .and_then(Attribute::as_bool)
            .unwrap_or(false)
    }

    pub fn file_of(id: u64) -> u32 {
        IdAllocator::file_of(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_equality_is_id_based() {
        let a = Node::new(1, NodeKind::Variable, "x", Span::zero(), 0, 1, ScopeId::ROOT);
        let b = Node::new(1, NodeKind::Class, "different", Span::zero(), 9, 1, ScopeId::ROOT);
        assert_eq!(a, b);
    }

    #[test]
    fn constructor_flag_round_trips() {
        let node = Node::new(1, NodeKind::Call, "Owner", Span::zero(), 0, 1, ScopeId::ROOT)
            .with_metadata("is_constructor", true);
        assert!(node.is_constructor());
    }
}
