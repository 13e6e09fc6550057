//! The parse-and-translate subsystem (spec.md §1–§6): domain model, the
//! `Translate`/`ParseDriver` application layer, the ports a `LanguageVisitor`
//! and a `GraphSink` must satisfy, and the bundled infrastructure
//! implementations (the per-language visitors, the in-memory reference sink).

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
