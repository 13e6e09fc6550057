//! Feature-first modules. `parsing` is the only feature this crate ships —
//! the parse-and-translate subsystem spec.md §1 scopes the core to.

pub mod parsing;
