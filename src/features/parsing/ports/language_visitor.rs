//! LanguageVisitor port
//!
//! spec.md §4.4: one visitor per source language, each mapping its own
//! tree-sitter grammar onto the shared `Translate` primitives through a
//! single uniform entry point, `traverse_node`. Grounded on the teacher's
//! `ports/language_plugin.rs` (`LanguagePlugin` trait, `LanguageRegistry`)
//! generalized from a whole-file `extract` call to the spec's per-node
//! dispatch contract.

use std::collections::HashMap;

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::Translate;
use crate::features::parsing::domain::ScopeId;
use crate::shared::utils::INVALID;

/// Implemented once per source language. `traverse_node` is called with the
/// current tree-sitter node and the lexical scope it should emit into, and
/// returns the id of whatever node it emitted for that syntax node (or
/// `shared::utils::INVALID` for syntax that contributes no node of its
/// own — e.g. punctuation, or a statement the visitor doesn't model yet).
pub trait LanguageVisitor: Send + Sync {
    /// Short tag this visitor registers under (`"java"`, `"python"`, ...).
    fn language_tag(&self) -> &'static str;

    /// File extensions this visitor claims, without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    fn tree_sitter_language(&self) -> TsLanguage;

    /// Translate one syntax node, recursing into its children as needed and
    /// emitting through `translate`. Called once with the tree's root node
    /// to drive a whole file, and recursively thereafter.
    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64;
}

/// Dispatches a file to the `LanguageVisitor` registered for its extension
/// (spec.md §6 "one file -> one language -> one visitor").
#[derive(Default)]
pub struct LanguageRegistry {
    by_tag: HashMap<&'static str, Box<dyn LanguageVisitor>>,
    by_extension: HashMap<&'static str, &'static str>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, visitor: Box<dyn LanguageVisitor>) {
        let tag = visitor.language_tag();
        for ext in visitor.extensions() {
            self.by_extension.insert(ext, tag);
        }
        self.by_tag.insert(tag, visitor);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn LanguageVisitor> {
        self.by_tag.get(tag).map(|v| v.as_ref())
    }

    pub fn for_extension(&self, extension: &str) -> Option<&dyn LanguageVisitor> {
        let tag = self.by_extension.get(extension)?;
        self.get(tag)
    }
}

/// Shorthand used by visitors to mean "no node emitted for this syntax".
pub const NO_NODE: u64 = INVALID;
