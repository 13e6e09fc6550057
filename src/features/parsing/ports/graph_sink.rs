//! GraphSink port
//!
//! spec.md §4.5: the interface `Translate` emits nodes and relations
//! through. Every mutating call must be idempotent keyed by `(from, to,
//! label)` for relations and by `id` for nodes (spec.md §3 invariant). The
//! sink is the one piece of shared state a repository build's per-file
//! threads all touch (spec.md §5) — implementations must be `Send + Sync`.

use crate::features::parsing::domain::{Node, Relation, RelationKind};
use crate::shared::models::{Result, Span};

/// Port consumed by the `Translate` engine. Grounded on the teacher's
/// `ports/language_plugin.rs` port-trait style (default-method-heavy,
/// `Send + Sync` bound) and `features/graph_builder/domain/mod.rs`'s
/// `GraphDocument` indexing shape for the reference in-memory
/// implementation.
pub trait GraphSink: Send + Sync {
    /// Persist one node. A duplicate `id` is a no-op (spec.md §3).
    fn create_node(&self, node: Node) -> Result<()>;

    /// Persist one directed edge. A duplicate `(from, to, label)` is a
    /// no-op (spec.md §3).
    fn create_relation(&self, relation: Relation) -> Result<()>;

    fn create_contains(&self, parent: u64, child: u64, file_id: u32) -> Result<()> {
        self.create_relation(Relation::new(parent, child, RelationKind::Contains, file_id))
    }

    fn create_has_field(&self, class: u64, field: u64, file_id: u32) -> Result<()> {
        self.create_relation(Relation::new(class, field, RelationKind::HasField, file_id))
    }

    /// `Import` nodes are emitted like any other node; this exists as a
    /// named entry point per spec.md §4.5 so implementations can special
    /// case import bookkeeping (e.g. indexing by `importPath`) without the
    /// caller needing to know that.
    fn create_import(&self, node: Node) -> Result<()> {
        self.create_node(node)
    }

    /// ASSIGN edge: from each RHS-referenced node to the LHS variable
    /// (spec.md §4.3 `handle_assignment`).
    fn create_assignment(&self, rhs: u64, lhs: u64, _range: Span, file_id: u32) -> Result<()> {
        self.create_relation(Relation::new(rhs, lhs, RelationKind::Assign, file_id))
    }

    /// DATAFLOW edge, emitted alongside ASSIGN for the same `(rhs, lhs)`
    /// pair (spec.md §3 invariant, §8.7 "RHS sealing").
    fn create_dataflow(&self, rhs: u64, lhs: u64, file_id: u32) -> Result<()> {
        self.create_relation(Relation::new(rhs, lhs, RelationKind::Dataflow, file_id))
    }

    /// Per-file transaction boundary (SPEC_FULL.md §5, supplemental to the
    /// primitive list above): lets `ParseDriver` discard a cancelled file's
    /// partial graph without ever exposing it to readers. Reference sinks
    /// that have no notion of a pending/committed distinction may no-op all
    /// three.
    fn begin_file(&self, _file_id: u32) -> Result<()> {
        Ok(())
    }

    fn commit_file(&self, _file_id: u32) -> Result<()> {
        Ok(())
    }

    fn abort_file(&self, _file_id: u32) -> Result<()> {
        Ok(())
    }
}
