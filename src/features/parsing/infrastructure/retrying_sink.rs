//! Retry-with-backoff `GraphSink` decorator.
//!
//! spec.md §7 / SPEC_FULL.md §4.8: a `SinkError` is retried with exponential
//! backoff up to a fixed attempt cap; once the cap is spent the file's
//! transaction is aborted and the file is marked failed, but the repository
//! build proceeds. `ParseDriver` itself only calls through the `GraphSink`
//! port, so this decorator is where the retry policy actually lives —
//! wrap any sink (the bundled `InMemoryGraphSink` or a real graph-database
//! adapter) in one of these to get the policy for free.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::features::parsing::domain::{Node, Relation};
use crate::features::parsing::ports::GraphSink;
use crate::shared::models::{CodegraphError, Result, Span};

/// Wraps an inner `GraphSink`, retrying a `SinkError` up to `max_attempts`
/// times with a doubling delay starting at `base_delay`.
pub struct RetryingGraphSink {
    inner: Arc<dyn GraphSink>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryingGraphSink {
    /// Default policy: 5 attempts, starting at 10ms and doubling each retry
    /// (10, 20, 40, 80ms) — tuned for a flaky network-backed graph store,
    /// not a slow one.
    pub fn new(inner: Arc<dyn GraphSink>) -> Self {
        Self::with_policy(inner, 5, Duration::from_millis(10))
    }

    pub fn with_policy(inner: Arc<dyn GraphSink>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn retry(&self, what: &'static str, mut op: impl FnMut() -> Result<()>) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(CodegraphError::SinkError { file_id, message }) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::error!(what, attempt, "sink write exhausted retry budget, aborting file transaction");
                        return Err(CodegraphError::sink(file_id, message));
                    }
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(what, attempt, delay_ms = delay.as_millis() as u64, "sink write failed, retrying after backoff");
                    thread::sleep(delay);
                }
                Err(other) => return Err(other),
            }
        }
    }
}

impl GraphSink for RetryingGraphSink {
    fn create_node(&self, node: Node) -> Result<()> {
        self.retry("create_node", || self.inner.create_node(node.clone()))
    }

    fn create_relation(&self, relation: Relation) -> Result<()> {
        self.retry("create_relation", || self.inner.create_relation(relation.clone()))
    }

    fn create_import(&self, node: Node) -> Result<()> {
        self.retry("create_import", || self.inner.create_import(node.clone()))
    }

    fn create_contains(&self, parent: u64, child: u64, file_id: u32) -> Result<()> {
        self.retry("create_contains", || self.inner.create_contains(parent, child, file_id))
    }

    fn create_has_field(&self, class: u64, field: u64, file_id: u32) -> Result<()> {
        self.retry("create_has_field", || self.inner.create_has_field(class, field, file_id))
    }

    fn create_assignment(&self, rhs: u64, lhs: u64, range: Span, file_id: u32) -> Result<()> {
        self.retry("create_assignment", || self.inner.create_assignment(rhs, lhs, range, file_id))
    }

    fn create_dataflow(&self, rhs: u64, lhs: u64, file_id: u32) -> Result<()> {
        self.retry("create_dataflow", || self.inner.create_dataflow(rhs, lhs, file_id))
    }

    fn begin_file(&self, file_id: u32) -> Result<()> {
        self.inner.begin_file(file_id)
    }

    fn commit_file(&self, file_id: u32) -> Result<()> {
        self.inner.commit_file(file_id)
    }

    fn abort_file(&self, file_id: u32) -> Result<()> {
        self.inner.abort_file(file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::{NodeKind, RelationKind, ScopeId};
    use crate::shared::models::Span as ModelSpan;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A sink that fails `fail_times` calls to `create_node` before
    /// succeeding, to exercise the retry loop without a real backend.
    struct FlakySink {
        remaining_failures: AtomicU32,
        node_writes: AtomicU32,
    }

    impl GraphSink for FlakySink {
        fn create_node(&self, _node: Node) -> Result<()> {
            self.node_writes.fetch_add(1, Ordering::SeqCst);
            if self.remaining_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None }).is_ok() {
                return Err(CodegraphError::sink(1, "transient backend failure"));
            }
            Ok(())
        }

        fn create_relation(&self, _relation: Relation) -> Result<()> {
            Ok(())
        }
    }

    fn node() -> Node {
        Node::new(1, NodeKind::Variable, "x", ModelSpan::zero(), 1, 1, ScopeId::ROOT)
    }

    #[test]
    fn succeeds_after_transient_failures_within_budget() {
        let flaky = Arc::new(FlakySink {
            remaining_failures: AtomicU32::new(2),
            node_writes: AtomicU32::new(0),
        });
        let sink = RetryingGraphSink::with_policy(flaky.clone(), 5, Duration::from_millis(1));
        assert!(sink.create_node(node()).is_ok());
        assert_eq!(flaky.node_writes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_exhausting_retry_budget() {
        let flaky = Arc::new(FlakySink {
            remaining_failures: AtomicU32::new(10),
            node_writes: AtomicU32::new(0),
        });
        let sink = RetryingGraphSink::with_policy(flaky, 3, Duration::from_millis(1));
        let err = sink.create_node(node()).unwrap_err();
        assert!(matches!(err, CodegraphError::SinkError { .. }));
    }

    #[test]
    fn non_sink_errors_are_not_retried() {
        struct AlwaysDuplicate;
        impl GraphSink for AlwaysDuplicate {
            fn create_node(&self, _node: Node) -> Result<()> {
                Err(CodegraphError::duplicate_symbol("x", 0))
            }
            fn create_relation(&self, _relation: Relation) -> Result<()> {
                Ok(())
            }
        }
        let sink = RetryingGraphSink::with_policy(Arc::new(AlwaysDuplicate), 5, Duration::from_millis(1));
        assert!(matches!(sink.create_node(node()), Err(CodegraphError::DuplicateSymbol { .. })));
    }

    #[test]
    fn relation_writes_are_also_retried() {
        struct FlakyRelationSink {
            remaining: AtomicU32,
        }
        impl GraphSink for FlakyRelationSink {
            fn create_node(&self, _node: Node) -> Result<()> {
                Ok(())
            }
            fn create_relation(&self, _relation: Relation) -> Result<()> {
                if self.remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None }).is_ok() {
                    return Err(CodegraphError::sink(1, "transient"));
                }
                Ok(())
            }
        }
        let flaky = Arc::new(FlakyRelationSink { remaining: AtomicU32::new(1) });
        let sink = RetryingGraphSink::with_policy(flaky, 5, Duration::from_millis(1));
        assert!(sink.create_relation(Relation::new(1, 2, RelationKind::Contains, 1)).is_ok());
    }
}
