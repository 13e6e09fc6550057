//! codegraph-ir: the parse-and-translate core of a cross-language code
//! property graph builder.
//!
//! Given a source file and its language tag, this crate walks a tree-sitter
//! concrete syntax tree and emits a typed, uniquely-identified set of nodes
//! (modules, classes, functions, variables, calls, ...) and typed relations
//! between them (CONTAINS, CALLS, DATAFLOW, ...) through a `GraphSink`.
//! Everything downstream of that emission — the property-graph database, the
//! vector store, HTTP routing, CLI wiring — lives outside this crate; see
//! `spec.md` §1.

pub mod features;
pub mod shared;

pub use features::parsing::application::{FileInput, ParseDriver, ParseOutcome};
pub use features::parsing::domain::{Node, NodeKind, Relation, RelationKind};
pub use features::parsing::infrastructure::{languages::default_registry, InMemoryGraphSink, RetryingGraphSink};
pub use features::parsing::ports::{GraphSink, LanguageRegistry, LanguageVisitor};
pub use shared::models::{Attribute, CodegraphError, Metadata, Result, Span};
pub use shared::utils::CancellationToken;
