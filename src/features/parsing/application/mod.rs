//! Language-neutral emission engine and the drivers built on top of it.
//!
//! `Translate` is the only thing a `LanguageVisitor` is allowed to emit
//! nodes and relations through (spec.md §4.3); `NameChainResolver` is the
//! one non-trivial algorithm layered on top of it (spec.md §4.3 "Key
//! algorithm"); `ParseDriver` is the per-file orchestration spec.md §4.6
//! describes.

mod name_chain;
mod parse_driver;
mod translate;

pub use name_chain::NameChainResolver;
pub use parse_driver::{FileInput, ParseDriver, ParseOutcome};
pub use translate::{ParamSpec, Translate};
