//! Lexical scope stack and symbol table
//!
//! spec.md §3/§4.2: a `Scope` is a stack frame holding a parent link, a
//! symbol table, an RHS flag used for data-flow tracking, an ordered list of
//! RHS-referenced node ids, and the set of emitted-but-not-yet-CONTAINed
//! child node ids that bubble up on pop.
//!
//! Modeled as an arena (`Vec<Scope>` indexed by `ScopeId`) rather than
//! `Rc<RefCell<..>>`/reference-counted parent pointers, per the Design Notes
//! ("parent owns child; child holds a non-owning back-reference... never a
//! reciprocal owning pointer") — the arena index *is* that non-owning
//! back-reference.

use std::collections::HashMap;

use crate::shared::models::{CodegraphError, Result};

/// Index into the owning `ScopeArena`. Cheap to copy; never dangling for the
/// lifetime of the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// Every arena is created with this as its first (module) scope.
    pub const ROOT: ScopeId = ScopeId(0);
}

/// Pairs a name with the node that defines it. Classes additionally carry a
/// `fields` map so `resolve_name_chain` can descend `obj.field` statically
/// within one file (spec.md §3, §4.3).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub node_id: u64,
    pub fields: HashMap<String, Symbol>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, node_id: u64) -> Self {
        Self {
            name: name.into(),
            node_id,
            fields: HashMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.get(name)
    }

    /// Bind a child field the first time it is accessed; a repeated access
    /// must collapse to the same id, so this never overwrites an existing
    /// entry (spec.md §4.3 step 2).
    pub fn bind_field(&mut self, name: impl Into<String>, node_id: u64) -> &Symbol {
        let name = name.into();
        self.fields
            .entry(name.clone())
            .or_insert_with(|| Symbol::new(name, node_id))
    }
}

/// One lexical scope frame (spec.md §3).
#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Symbol>,
    is_rhs: bool,
    rhs_vars: Vec<u64>,
    not_contained_nodes: Vec<u64>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, is_rhs: bool) -> Self {
        Self {
            parent,
            symbols: HashMap::new(),
            is_rhs,
            rhs_vars: Vec::new(),
            not_contained_nodes: Vec::new(),
        }
    }
}

/// Owns every `Scope` created while translating one file. One arena per
/// file, per `Translate` — never shared across threads (spec.md §5).
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// A fresh arena containing only the root (module) scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, false)],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Create a child scope linked to `parent` (spec.md §4.2 `push`).
    pub fn push(&mut self, parent: ScopeId, is_rhs: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(parent), is_rhs));
        id
    }

    /// Remove a scope's bookkeeping from the arena and hand back the ids it
    /// accumulated as "not contained". The caller (`Translate`) decides
    /// whether to attach them via CONTAINS to `owner_node_id` or bubble them
    /// into the parent scope — see spec.md §4.2 `pop`.
    ///
    /// The scope itself is left as an empty, unreachable husk in the arena
    /// rather than physically removed: `ScopeId`s already handed out (e.g.
    /// recorded on `Node::scope_id`) must stay valid indices for the life of
    /// the arena.
    pub fn pop(&mut self, scope: ScopeId) -> Vec<u64> {
        std::mem::take(&mut self.scopes[scope.0 as usize].not_contained_nodes)
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    /// Merge ids bubbled up from a popped child scope into `scope`'s own
    /// "not contained" list.
    pub fn bubble_into(&mut self, scope: ScopeId, ids: Vec<u64>) {
        self.scopes[scope.0 as usize]
            .not_contained_nodes
            .extend(ids);
    }

    /// Record that `node_id` was emitted while `scope` was active and has
    /// not yet been attached via CONTAINS. Every node-creating primitive in
    /// `Translate` calls this immediately after allocating an id.
    pub fn record_emitted(&mut self, scope: ScopeId, node_id: u64) {
        self.scopes[scope.0 as usize]
            .not_contained_nodes
            .push(node_id);
    }

    /// Bind `name` to `node_id` in `scope`. Fails with `DuplicateSymbol` if
    /// the name is already bound in this exact scope — shadowing is
    /// expressed by nesting a new scope, not by overwriting (spec.md §3,
    /// §4.2 `add_symbol`).
    pub fn add_symbol(&mut self, scope: ScopeId, symbol: Symbol) -> Result<()> {
        let frame = &mut self.scopes[scope.0 as usize];
        if frame.symbols.contains_key(&symbol.name) {
            return Err(CodegraphError::duplicate_symbol(symbol.name, scope.0));
        }
        frame.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Walk up the parent chain from `scope`; first match wins (spec.md §3
    /// scope-discipline invariant, §4.2 `resolve`).
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<Symbol> {
        let mut cursor = Some(scope);
        while let Some(s) = cursor {
            let frame = &self.scopes[s.0 as usize];
            if let Some(sym) = frame.symbols.get(name) {
                return Some(sym.clone());
            }
            cursor = frame.parent;
        }
        None
    }

    /// The scope (at or above `scope`) a symbol named `name` is actually
    /// bound in, if any.
    pub fn owner_scope_of(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut cursor = Some(scope);
        while let Some(s) = cursor {
            let frame = &self.scopes[s.0 as usize];
            if frame.symbols.contains_key(name) {
                return Some(s);
            }
            cursor = frame.parent;
        }
        None
    }

    /// Descend `root_name`'s `Symbol.fields` through `path`, creating any
    /// missing hop via `create_missing` (invoked with the segment's name;
    /// expected to allocate and emit the corresponding `FieldRef` node and
    /// return its id). Returns the terminal node id, or `None` if `root_name`
    /// is unbound anywhere in `scope`'s chain.
    ///
    /// This is the mutable half of name-chain resolution (spec.md §4.3 "Key
    /// algorithm"): each resolved segment becomes a persistent field on the
    /// owner `Symbol` so repeated accesses to `a.b.c` collapse to the same
    /// id within the file.
    pub fn descend_fields(
        &mut self,
        scope: ScopeId,
        root_name: &str,
        path: &[String],
        mut create_missing: impl FnMut(&str) -> u64,
    ) -> Option<u64> {
        let owner_scope = self.owner_scope_of(scope, root_name)?;
        let mut current = self.scopes[owner_scope.0 as usize]
            .symbols
            .get_mut(root_name)?;
        for part in path {
            if !current.fields.contains_key(part) {
                let id = create_missing(part);
                current.bind_field(part.clone(), id);
            }
            current = current.fields.get_mut(part).expect("just bound above");
        }
        Some(current.node_id)
    }

    /// Same descent as [`ScopeArena::descend_fields`], but for callers that
    /// cannot hand this method a closure borrowing their own `&mut self`
    /// (the name-chain resolver needs to allocate ids and emit nodes through
    /// `Translate` while the arena itself is already mutably borrowed).
    /// `fallback_ids[i]` is used if `path[i]` is missing; callers over
    /// allocate one id per path segment up front and only the ones actually
    /// consumed — reported in the returned `Vec`, `(segment, id)` in path
    /// order — need a node emitted for them.
    pub fn descend_fields_with_ids(
        &mut self,
        scope: ScopeId,
        root_name: &str,
        path: &[String],
        fallback_ids: &[u64],
    ) -> Option<(u64, Vec<(String, u64)>)> {
        let owner_scope = self.owner_scope_of(scope, root_name)?;
        let mut current = self.scopes[owner_scope.0 as usize]
            .symbols
            .get_mut(root_name)?;
        let mut created = Vec::new();
        for (i, part) in path.iter().enumerate() {
            if !current.fields.contains_key(part) {
                let id = fallback_ids[i];
                current.bind_field(part.clone(), id);
                created.push((part.clone(), id));
            }
            current = current.fields.get_mut(part).expect("just bound above");
        }
        Some((current.node_id, created))
    }

    /// True iff `scope` or an RHS-marked ancestor is currently "inside" an
    /// RHS evaluation (spec.md §4.2 `is_rhs`).
    pub fn is_rhs(&self, scope: ScopeId) -> bool {
        self.innermost_rhs_scope(scope).is_some()
    }

    /// Push `id` onto the ordered `rhs_vars` list of the nearest RHS-marked
    /// scope in `scope`'s ancestor chain; no-op if none exists (spec.md §4.2
    /// `add_rhs_var`).
    pub fn add_rhs_var(&mut self, scope: ScopeId, id: u64) {
        if let Some(s) = self.innermost_rhs_scope(scope) {
            self.scopes[s.0 as usize].rhs_vars.push(id);
        }
    }

    /// Drain and return the RHS-referenced ids accumulated by `scope`
    /// (itself, not an ancestor) — used by `handle_assignment` once the RHS
    /// expression has been fully evaluated under a fresh RHS scope.
    pub fn take_rhs_vars(&mut self, scope: ScopeId) -> Vec<u64> {
        std::mem::take(&mut self.scopes[scope.0 as usize].rhs_vars)
    }

    fn innermost_rhs_scope(&self, mut scope: ScopeId) -> Option<ScopeId> {
        loop {
            let frame = &self.scopes[scope.0 as usize];
            if frame.is_rhs {
                return Some(scope);
            }
            scope = frame.parent?;
        }
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_symbol_in_same_scope_fails() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_symbol(root, Symbol::new("x", 1)).unwrap();
        let err = arena.add_symbol(root, Symbol::new("x", 2)).unwrap_err();
        assert!(matches!(err, CodegraphError::DuplicateSymbol { .. }));
    }

    #[test]
    fn shadowing_via_nested_scope_resolves_innermost_first() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_symbol(root, Symbol::new("x", 1)).unwrap();
        let inner = arena.push(root, false);
        arena.add_symbol(inner, Symbol::new("x", 2)).unwrap();

        assert_eq!(arena.resolve(inner, "x").unwrap().node_id, 2);
        assert_eq!(arena.resolve(root, "x").unwrap().node_id, 1);
    }

    #[test]
    fn unresolved_name_returns_none() {
        let arena = ScopeArena::new();
        assert!(arena.resolve(arena.root(), "missing").is_none());
    }

    #[test]
    fn not_contained_nodes_bubble_on_pop_without_owner() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let block = arena.push(root, false);
        arena.record_emitted(block, 42);
        let bubbled = arena.pop(block);
        assert_eq!(bubbled, vec![42]);
        arena.bubble_into(root, bubbled);
        assert_eq!(arena.pop(root), vec![42]);
    }

    #[test]
    fn rhs_vars_accumulate_only_under_rhs_scope() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        assert!(!arena.is_rhs(root));

        let rhs_scope = arena.push(root, true);
        assert!(arena.is_rhs(rhs_scope));
        arena.add_rhs_var(rhs_scope, 7);
        arena.add_rhs_var(rhs_scope, 8);
        assert_eq!(arena.take_rhs_vars(rhs_scope), vec![7, 8]);

        // Not RHS: no-op, nothing accumulates.
        arena.add_rhs_var(root, 99);
        assert!(arena.take_rhs_vars(root).is_empty());
    }

    #[test]
    fn nested_non_rhs_scope_still_resolves_to_enclosing_rhs_scope() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let rhs_scope = arena.push(root, true);
        let nested_block = arena.push(rhs_scope, false);
        assert!(arena.is_rhs(nested_block));
        arena.add_rhs_var(nested_block, 5);
        assert_eq!(arena.take_rhs_vars(rhs_scope), vec![5]);
    }

    #[test]
    fn name_chain_descent_creates_fields_once_and_reuses() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_symbol(root, Symbol::new("obj", 100)).unwrap();

        let mut next_id = 200u64;
        let path = vec!["field".to_string()];
        let first = arena
            .descend_fields(root, "obj", &path, |_| {
                next_id += 1;
                next_id
            })
            .unwrap();

        let second = arena
            .descend_fields(root, "obj", &path, |_| {
                next_id += 1;
                next_id
            })
            .unwrap();

        assert_eq!(first, second, "repeated field access must collapse to one id");
    }

    #[test]
    fn descend_fields_with_ids_only_reports_newly_created_hops() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_symbol(root, Symbol::new("obj", 100)).unwrap();

        let path = vec!["a".to_string(), "b".to_string()];
        let (terminal, created) = arena
            .descend_fields_with_ids(root, "obj", &path, &[201, 202])
            .unwrap();
        assert_eq!(terminal, 202);
        assert_eq!(created, vec![("a".to_string(), 201), ("b".to_string(), 202)]);

        // Second pass over the same path creates nothing new.
        let (terminal2, created2) = arena
            .descend_fields_with_ids(root, "obj", &path, &[999, 999])
            .unwrap();
        assert_eq!(terminal2, 202);
        assert!(created2.is_empty());
    }
}
