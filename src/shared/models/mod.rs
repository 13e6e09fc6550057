//! Shared models used across the parsing feature.

mod attribute;
mod error;
mod span;

pub use attribute::{Annotation, Attribute, Metadata};
pub use error::{CodegraphError, Result};
pub use span::{Location, Span};
