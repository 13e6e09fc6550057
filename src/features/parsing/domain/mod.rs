//! Core data model: `Node`, `Relation`, lexical `Scope`/`SymbolTable`.
//!
//! Pure domain types — no tree-sitter, no I/O. Mirrors the teacher's
//! `features/parsing/domain/mod.rs` layout of re-exporting submodules from
//! one `mod.rs`.

mod node;
mod relation;
mod scope;

pub use node::{synthetic_name, Node, NodeKind};
pub use relation::{Relation, RelationKind};
pub use scope::{Scope, ScopeArena, ScopeId, Symbol};
