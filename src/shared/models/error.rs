//! Error types for the codegraph-ir crate
//!
//! One variant per error kind spec.md §7 names. Nothing in the core uses
//! unwinding for normal control flow (§7) — every primitive returns a
//! nullable/invalid sentinel or one of these as an explicit `Result`.

use thiserror::Error;

/// Error kinds, matching spec.md §7 labels exactly.
#[derive(Debug, Error)]
pub enum CodegraphError {
    /// Unreadable file or unsupported language. File is skipped, build
    /// continues.
    #[error("input error in {file_path}: {message}")]
    InputError { file_path: String, message: String },

    /// The concrete syntax tree has error nodes. Recorded on the
    /// module-scope node's metadata; traversal continues.
    #[error("parse error in {file_path}:{line}: {message}")]
    ParseError {
        file_path: String,
        line: u32,
        message: String,
    },

    /// Two symbols with the same name in the same scope. Non-fatal; the
    /// second definition is bound under a disambiguating `name#2` suffix.
    #[error("duplicate symbol `{name}` in scope {scope_id}")]
    DuplicateSymbol { name: String, scope_id: u32 },

    /// A file produced more than 2^32 nodes. Fatal; aborts the run.
    #[error("node id space exhausted for file {file_id}")]
    IdOverflow { file_id: u32 },

    /// A relation could not be persisted after the retry budget was spent.
    /// The file's transaction is aborted; the repository build proceeds.
    #[error("sink error committing file {file_id}: {message}")]
    SinkError { file_id: u32, message: String },

    /// Propagated from a tripped cancellation token; the caller decides
    /// what to do with a cancelled file.
    #[error("cancelled")]
    Cancelled,

    /// Internal invariant violation — a bug, not user-caused.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodegraphError {
    pub fn input(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputError {
            file_path: file_path.into(),
            message: message.into(),
        }
    }

    pub fn parse(file_path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::ParseError {
            file_path: file_path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn duplicate_symbol(name: impl Into<String>, scope_id: u32) -> Self {
        Self::DuplicateSymbol {
            name: name.into(),
            scope_id,
        }
    }

    pub fn sink(file_id: u32, message: impl Into<String>) -> Self {
        Self::SinkError {
            file_id,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// §7: only `IdOverflow` aborts the whole run; everything else is
    /// non-fatal at the repository-build level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CodegraphError::IdOverflow { .. })
    }
}

pub type Result<T> = std::result::Result<T, CodegraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_id_overflow_is_fatal() {
        assert!(CodegraphError::IdOverflow { file_id: 1 }.is_fatal());
        assert!(!CodegraphError::Cancelled.is_fatal());
        assert!(!CodegraphError::duplicate_symbol("x", 0).is_fatal());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = CodegraphError::parse("a.py", 12, "unexpected token");
        let msg = format!("{}", err);
        assert!(msg.contains("a.py"));
        assert!(msg.contains("12"));
        assert!(msg.contains("unexpected token"));
    }
}
