//! Helpers shared across every `LanguageVisitor` implementation.
//!
//! Grounded on the teacher's `plugins/*.rs` files, which each reimplement
//! `ctx.node_text(&n)` / `node.to_span()` / "traverse every child the
//! dispatcher doesn't recognize" inline; pulled out once here since every
//! visitor in this crate needs the identical three things.

use tree_sitter::Node as TsNode;

use crate::features::parsing::application::Translate;
use crate::features::parsing::domain::ScopeId;
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Annotation, Attribute, Metadata, Result, Span};

/// Source text covered by `node`. Tree-sitter nodes are always valid UTF-8
/// slices of `source` for a grammar that accepted the file; an invalid slice
/// only happens on a byte-level mismatch between `source` and the tree it
/// was parsed from, which a visitor can't recover from anyway.
pub fn text<'a>(node: TsNode, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub fn span(node: TsNode) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(start.row as u32 + 1, start.column as u32, end.row as u32 + 1, end.column as u32)
}

/// spec.md §4.4: "recursively traverse the named children of anything it
/// does not explicitly handle" — the fallback every dispatch arm's default
/// case delegates to, so no syntax node (including tree-sitter's own ERROR
/// nodes) silently drops its descendants.
pub fn traverse_children(visitor: &dyn LanguageVisitor, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if translate.is_cancelled() {
            return;
        }
        visitor.traverse_node(translate, source, child, scope);
    }
}

/// spec.md §8 S6: normalize a possibly-signature-decorated method name
/// (`"findById(Long) : Optional<User>"` or `"Optional<User> findById(Long)"`)
/// down to the bare identifier — the token before the first `(`, and if
/// that token has internal whitespace, its last whitespace-separated word.
pub fn normalize_method_name(raw: &str) -> String {
    let before_paren = raw.split('(').next().unwrap_or(raw).trim();
    match before_paren.rsplit(char::is_whitespace).next() {
        Some(word) if !word.is_empty() => word.to_string(),
        _ => before_paren.to_string(),
    }
}

/// Append one encoded annotation/decorator to `metadata.annotations`
/// (spec.md §3/§4.4: a `StrList` of JSON-encoded `{name, arguments?}`
/// strings).
pub fn push_annotation(metadata: &mut Metadata, annotation: Annotation) {
    let encoded = annotation.to_json_string();
    match metadata.get_mut("annotations") {
        Some(Attribute::StrList(list)) => list.push(encoded),
        _ => {
            metadata.insert("annotations".to_string(), Attribute::StrList(vec![encoded]));
        }
    }
}

/// `LanguageVisitor::traverse_node` returns a bare `u64`, not a `Result`
/// (spec.md §4.4) — a `Translate` primitive failure (almost always a
/// `DuplicateSymbol`, already non-fatal and logged inside `Translate`
/// itself) is logged here and treated as "no node emitted" rather than
/// unwinding, consistent with §7 "nothing in the core uses unwinding for
/// normal control flow".
pub fn settle(result: Result<u64>) -> u64 {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "translate primitive failed; node dropped");
        NO_NODE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_trailing_signature() {
        assert_eq!(normalize_method_name("findById(Long) : Optional<User>"), "findById");
    }

    #[test]
    fn normalizes_leading_return_type() {
        assert_eq!(normalize_method_name("Optional<User> findById(Long)"), "findById");
    }

    #[test]
    fn bare_name_is_unchanged() {
        assert_eq!(normalize_method_name("findById"), "findById");
    }

    #[test]
    fn annotations_accumulate_in_order() {
        let mut metadata = Metadata::new();
        push_annotation(&mut metadata, Annotation::new("Override"));
        push_annotation(&mut metadata, Annotation::new("GetMapping").with_argument("value", "/u"));
        let list = metadata.get("annotations").unwrap().as_str_list().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].contains("Override"));
        assert!(list[1].contains("GetMapping"));
    }
}
