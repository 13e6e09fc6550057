//! Bundled `LanguageVisitor` implementations, one module per source
//! language, plus the helpers (`common`) every one of them shares.

mod common;
mod csharp;
mod go;
mod java;
mod python;
mod typescript;

pub use common::{normalize_method_name, push_annotation, settle, span, text, traverse_children};
pub use csharp::CSharpVisitor;
pub use go::GoVisitor;
pub use java::JavaVisitor;
pub use python::PythonVisitor;
pub use typescript::TypeScriptVisitor;

use crate::features::parsing::ports::LanguageRegistry;

/// A registry with every visitor this crate bundles already registered,
/// keyed by the extensions spec.md §4.4 lists (Java, Python, Go,
/// TypeScript/JS, C#). Callers needing only a subset build their own
/// `LanguageRegistry` and register individual visitors instead.
pub fn default_registry() -> LanguageRegistry {
    let mut registry = LanguageRegistry::new();
    registry.register(Box::new(PythonVisitor::new()));
    registry.register(Box::new(JavaVisitor::new()));
    registry.register(Box::new(GoVisitor::new()));
    registry.register(Box::new(TypeScriptVisitor::new()));
    registry.register(Box::new(CSharpVisitor::new()));
    registry
}
