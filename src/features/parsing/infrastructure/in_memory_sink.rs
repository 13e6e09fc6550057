//! Reference `GraphSink` backed by in-process maps.
//!
//! No external graph database is wired up here — this is the sink used by
//! tests and by callers that just want the emitted `(Node, Relation)` set in
//! memory. Concurrent-safe via `DashMap` so many file-level `Translate`s can
//! write through it at once, matching the one-sink-many-workers model a
//! repository build uses.

use dashmap::DashMap;

use crate::features::parsing::domain::{Node, Relation, RelationKind};
use crate::features::parsing::ports::GraphSink;
use crate::shared::models::Result;

type RelationKey = (u64, u64, RelationKind);

#[derive(Default)]
pub struct InMemoryGraphSink {
    nodes: DashMap<u64, Node>,
    relations: DashMap<RelationKey, Relation>,
    pending_nodes: DashMap<u32, Vec<u64>>,
    pending_relations: DashMap<u32, Vec<RelationKey>>,
}

impl InMemoryGraphSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.iter().map(|e| e.value().clone()).collect()
    }

    pub fn relations(&self) -> Vec<Relation> {
        self.relations.iter().map(|e| e.value().clone()).collect()
    }

    pub fn node(&self, id: u64) -> Option<Node> {
        self.nodes.get(&id).map(|e| e.value().clone())
    }

    pub fn relations_from(&self, id: u64) -> Vec<Relation> {
        self.relations.iter().filter(|e| e.value().from == id).map(|e| e.value().clone()).collect()
    }

    pub fn relations_to(&self, id: u64) -> Vec<Relation> {
        self.relations.iter().filter(|e| e.value().to == id).map(|e| e.value().clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

impl GraphSink for InMemoryGraphSink {
    fn create_node(&self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Ok(());
        }
        let file_id = node.file_id;
        let id = node.id;
        self.nodes.insert(id, node);
        self.pending_nodes.entry(file_id).or_default().push(id);
        Ok(())
    }

    fn create_relation(&self, relation: Relation) -> Result<()> {
        let key = relation.dedup_key();
        if self.relations.contains_key(&key) {
            return Ok(());
        }
        let file_id = relation.file_id;
        self.relations.insert(key, relation);
        self.pending_relations.entry(file_id).or_default().push(key);
        Ok(())
    }

    fn begin_file(&self, file_id: u32) -> Result<()> {
        self.pending_nodes.insert(file_id, Vec::new());
        self.pending_relations.insert(file_id, Vec::new());
        Ok(())
    }

    fn commit_file(&self, file_id: u32) -> Result<()> {
        self.pending_nodes.remove(&file_id);
        self.pending_relations.remove(&file_id);
        Ok(())
    }

    fn abort_file(&self, file_id: u32) -> Result<()> {
        if let Some((_, ids)) = self.pending_nodes.remove(&file_id) {
            for id in ids {
                self.nodes.remove(&id);
            }
        }
        if let Some((_, keys)) = self.pending_relations.remove(&file_id) {
            for key in keys {
                self.relations.remove(&key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::NodeKind;
    use crate::shared::models::Span;

    fn node(id: u64) -> Node {
        Node::new(id, NodeKind::Variable, "x", Span::zero(), 0, 1, crate::features::parsing::domain::ScopeId::ROOT)
    }

    #[test]
    fn duplicate_node_insert_is_a_no_op() {
        let sink = InMemoryGraphSink::new();
        sink.create_node(node(1)).unwrap();
        sink.create_node(Node::new(1, NodeKind::Class, "renamed", Span::zero(), 0, 1, crate::features::parsing::domain::ScopeId::ROOT))
            .unwrap();
        assert_eq!(sink.node_count(), 1);
        assert_eq!(sink.node(1).unwrap().name, "x");
    }

    #[test]
    fn duplicate_relation_insert_is_a_no_op() {
        let sink = InMemoryGraphSink::new();
        let rel = Relation::new(1, 2, RelationKind::Contains, 0);
        sink.create_relation(rel.clone()).unwrap();
        sink.create_relation(rel).unwrap();
        assert_eq!(sink.relation_count(), 1);
    }

    #[test]
    fn abort_file_rolls_back_only_that_files_pending_writes() {
        let sink = InMemoryGraphSink::new();
        sink.begin_file(1).unwrap();
        sink.create_node(node(1)).unwrap();
        sink.create_relation(Relation::new(1, 1, RelationKind::Contains, 1)).unwrap();

        sink.begin_file(2).unwrap();
        sink.create_node(node((2u64 << 32) | 1)).unwrap();

        sink.abort_file(1).unwrap();

        assert!(sink.node(1).is_none());
        assert_eq!(sink.relation_count(), 0);
        assert!(sink.node((2u64 << 32) | 1).is_some());
    }

    #[test]
    fn commit_file_keeps_writes_and_clears_pending_bookkeeping() {
        let sink = InMemoryGraphSink::new();
        sink.begin_file(3).unwrap();
        sink.create_node(node((3u64 << 32) | 1)).unwrap();
        sink.commit_file(3).unwrap();
        assert!(sink.node((3u64 << 32) | 1).is_some());
    }
}
