//! Graph relation (edge)
//!
//! spec.md §3: a directed labeled edge between two node ids, carrying a
//! file-id and an optional ordinal (used to preserve, e.g., argument order
//! in a CALLS edge or branch order in a Conditional). A CALLS relation
//! additionally records the call-site range (spec.md §3 invariant: "A CALLS
//! relation has non-null endpoints and records call-site range").

use crate::shared::models::Span;

/// Relation label, exactly the closed set spec.md §3 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Contains,
    HasField,
    Calls,
    Assign,
    Dataflow,
    Import,
    Extends,
    Implements,
    Scopes,
    References,
}

/// One directed edge. Relations are inserted idempotently: a duplicate
/// `(from, to, label)` insertion is a no-op (spec.md §3 invariant); that
/// dedup is enforced by the `GraphSink`, not by this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub from: u64,
    pub to: u64,
    pub label: RelationKind,
    pub file_id: u32,
    pub ordinal: Option<u32>,
    pub call_site: Option<Span>,
}

impl Relation {
    pub fn new(from: u64, to: u64, label: RelationKind, file_id: u32) -> Self {
        Self {
            from,
            to,
            label,
            file_id,
            ordinal: None,
            call_site: None,
        }
    }

    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Attach the call-site range a CALLS relation must carry.
    pub fn with_call_site(mut self, range: Span) -> Self {
        self.call_site = Some(range);
        self
    }

    /// The key relation dedup is keyed on (spec.md §3 invariant).
    pub fn dedup_key(&self) -> (u64, u64, RelationKind) {
        (self.from, self.to, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_ignores_ordinal_and_file() {
        let a = Relation::new(1, 2, RelationKind::Calls, 0).with_ordinal(0);
        let b = Relation::new(1, 2, RelationKind::Calls, 9).with_ordinal(5);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
