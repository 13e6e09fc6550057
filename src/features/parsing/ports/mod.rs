//! Ports the parsing feature exposes to its infrastructure adapters.

mod graph_sink;
mod language_visitor;

pub use graph_sink::GraphSink;
pub use language_visitor::{LanguageRegistry, LanguageVisitor, NO_NODE};
