//! Language-neutral graph emission.
//!
//! `Translate` is the engine every `LanguageVisitor` drives. It owns the
//! scope stack and id allocator for one file and knows how to turn a
//! class/function/assignment/call/loop/conditional into nodes and relations
//! on a `GraphSink`. Visitors never construct nodes or relations directly —
//! they call these primitives and let `Translate` handle scope discipline,
//! id allocation, and containment bookkeeping.

use std::sync::Arc;

use crate::features::parsing::domain::{Node, NodeKind, Relation, RelationKind, ScopeArena, ScopeId, Symbol};
use crate::features::parsing::ports::GraphSink;
use crate::shared::models::{Attribute, CodegraphError, Metadata, Result, Span};
use crate::shared::utils::{CancellationToken, IdAllocator};

/// One parameter of a function/method being created via [`Translate::create_function`].
pub struct ParamSpec {
    pub name: String,
    pub range: Span,
    /// Parameters that carry a declared type additionally get a HAS_FIELD
    /// edge from the function, alongside the CONTAINS every parameter gets.
    pub is_typed: bool,
    pub metadata: Metadata,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, range: Span) -> Self {
        Self {
            name: name.into(),
            range,
            is_typed: false,
            metadata: Metadata::new(),
        }
    }

    pub fn typed(mut self) -> Self {
        self.is_typed = true;
        self
    }
}

type ScopedThunk<'a> = Box<dyn FnOnce(&mut Translate, ScopeId) + 'a>;

pub struct Translate {
    sink: Arc<dyn GraphSink>,
    scopes: ScopeArena,
    ids: IdAllocator,
    file_id: u32,
    version: u32,
    function_stack: Vec<u64>,
    class_stack: Vec<(u64, ScopeId)>,
    cancellation: CancellationToken,
    /// Import nodes emitted so far, in emission order. The module-scope
    /// node doesn't exist yet when `handle_import` runs (spec.md §4.6: it
    /// is created once traversal finishes), so the IMPORT relation spec.md
    /// §3 lists alongside CONTAINS/CALLS/... is deferred and emitted in one
    /// batch from `finish`.
    imports: Vec<u64>,
}

impl Translate {
    pub fn new(file_id: u32, version: u32, sink: Arc<dyn GraphSink>, cancellation: CancellationToken) -> Self {
        Self {
            sink,
            scopes: ScopeArena::new(),
            ids: IdAllocator::new(file_id),
            file_id,
            version,
            function_stack: Vec::new(),
            class_stack: Vec::new(),
            cancellation,
            imports: Vec::new(),
        }
    }

    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    pub fn root_scope(&self) -> ScopeId {
        self.scopes.root()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    // -- crate-visible plumbing used by NameChainResolver -------------------

    pub(crate) fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    pub(crate) fn scopes_mut(&mut self) -> &mut ScopeArena {
        &mut self.scopes
    }

    pub(crate) fn current_class(&self) -> Option<(u64, ScopeId)> {
        self.class_stack.last().copied()
    }

    pub(crate) fn emit_node(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        range: Span,
        scope: ScopeId,
        metadata: Metadata,
    ) -> Result<u64> {
        let id = self.ids.next_id()?;
        self.emit_node_with_id(id, kind, name, range, scope, metadata)?;
        Ok(id)
    }

    /// Allocate an id without emitting a node for it yet — used by the
    /// name-chain resolver, which must reserve ids for possibly-missing
    /// field hops before it knows which of them are actually missing.
    pub(crate) fn allocate_id(&mut self) -> Result<u64> {
        self.ids.next_id()
    }

    /// Emit a node under an id obtained from [`Translate::allocate_id`].
    pub(crate) fn emit_node_with_id(
        &mut self,
        id: u64,
        kind: NodeKind,
        name: impl Into<String>,
        range: Span,
        scope: ScopeId,
        metadata: Metadata,
    ) -> Result<()> {
        let mut node = Node::new(id, kind, name, range, self.file_id, self.version, scope);
        node.metadata = metadata;
        self.sink.create_node(node)?;
        self.scopes.record_emitted(scope, id);
        Ok(())
    }

    /// Bind `name` to `node_id` in `scope`. A collision is non-fatal: it is
    /// logged and the second definition is bound under a disambiguating
    /// `name#2`, `name#3`, ... suffix instead (error-handling design §7).
    pub(crate) fn bind_symbol(&mut self, scope: ScopeId, name: &str, node_id: u64) -> Result<()> {
        match self.scopes.add_symbol(scope, Symbol::new(name, node_id)) {
            Ok(()) => Ok(()),
            Err(CodegraphError::DuplicateSymbol { .. }) => {
                tracing::warn!(name, scope = scope.0, "duplicate symbol in scope, suffixing");
                let mut suffix = 2u32;
                loop {
                    let candidate = format!("{name}#{suffix}");
                    if self
                        .scopes
                        .add_symbol(scope, Symbol::new(candidate, node_id))
                        .is_ok()
                    {
                        return Ok(());
                    }
                    suffix += 1;
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Pop `scope`, attaching its residual not-contained nodes to `owner` via
    /// CONTAINS, or bubbling them to `scope`'s parent if there is no owner.
    fn end_scope(&mut self, owner: Option<u64>, scope: ScopeId) -> Result<()> {
        let bubbled = self.scopes.pop(scope);
        match owner {
            Some(owner_id) => {
                for child in bubbled {
                    self.sink.create_contains(owner_id, child, self.file_id)?;
                }
            }
            None => {
                if let Some(parent) = self.scopes.parent_of(scope) {
                    self.scopes.bubble_into(parent, bubbled);
                }
            }
        }
        Ok(())
    }

    /// Final pop of the file's root scope, called once the whole tree has
    /// been traversed: whatever never found a more specific owner attaches
    /// directly to the module-scope node.
    pub fn finish(&mut self, module_scope_id: u64) -> Result<()> {
        self.end_scope(Some(module_scope_id), self.scopes.root())?;
        for import_id in std::mem::take(&mut self.imports) {
            self.sink
                .create_relation(Relation::new(module_scope_id, import_id, RelationKind::Import, self.file_id))?;
        }
        Ok(())
    }

    // -- primitives ----------------------------------------------------------

    /// Emit an Import node (spec.md §4.4: one per import/using/require
    /// directive, `metadata.importPath` set by the caller, `name` the last
    /// path segment) and bind it as a symbol so a later name-chain whose
    /// head names this import resolves through it (spec.md §4.3 tie-break
    /// "a chain whose head is a module-qualified import resolves through
    /// the Import symbol").
    pub fn handle_import(&mut self, scope: ScopeId, name: &str, range: Span, metadata: Metadata) -> Result<u64> {
        let id = self.ids.next_id()?;
        let mut node = Node::new(id, NodeKind::Import, name, range, self.file_id, self.version, scope);
        node.metadata = metadata;
        self.sink.create_import(node)?;
        self.scopes.record_emitted(scope, id);
        self.bind_symbol(scope, name, id)?;
        self.imports.push(id);
        Ok(id)
    }

    /// Emit a TypeRef node for a type-position name (a superclass, an
    /// interface, a generic type argument, a declared parameter/field type)
    /// that is not itself a value binding. Not bound as a symbol: type names
    /// and value names never share the same resolution chain.
    pub fn emit_type_ref(&mut self, scope: ScopeId, name: &str, range: Span, metadata: Metadata) -> Result<u64> {
        self.emit_node(NodeKind::TypeRef, name, range, scope, metadata)
    }

    pub fn new_module_scope(&mut self, name: &str, range: Span, metadata: Metadata) -> Result<u64> {
        let root = self.scopes.root();
        let id = self.ids.next_id()?;
        let mut node = Node::new(id, NodeKind::ModuleScope, name, range, self.file_id, self.version, root);
        node.metadata = metadata;
        self.sink.create_node(node)?;
        Ok(id)
    }

    /// Create a Class node, push its scope, let `populate` emit fields and
    /// methods into that scope, then attach everything left over via
    /// CONTAINS on pop.
    pub fn handle_class(
        &mut self,
        scope: ScopeId,
        name: &str,
        range: Span,
        metadata: Metadata,
        populate: impl FnOnce(&mut Translate, u64, ScopeId),
    ) -> Result<u64> {
        let extends = metadata.get("extends").and_then(Attribute::as_str).map(str::to_string);
        let implements = metadata.get("implements").and_then(Attribute::as_str_list).map(<[String]>::to_vec);

        let id = self.emit_node(NodeKind::Class, name, range, scope, metadata)?;
        self.bind_symbol(scope, name, id)?;

        if let Some(superclass) = extends {
            let target = self.resolve_type_name(scope, &superclass, range)?;
            self.sink.create_relation(Relation::new(id, target, RelationKind::Extends, self.file_id))?;
        }
        for interface in implements.into_iter().flatten() {
            let target = self.resolve_type_name(scope, &interface, range)?;
            self.sink.create_relation(Relation::new(id, target, RelationKind::Implements, self.file_id))?;
        }

        let class_scope = self.scopes.push(scope, false);
        self.class_stack.push((id, class_scope));
        populate(self, id, class_scope);
        self.class_stack.pop();
        self.end_scope(Some(id), class_scope)?;
        Ok(id)
    }

    /// Resolve a type-position name (an `extends`/`implements` target) the
    /// same way a value name-chain head resolves: reuse an existing symbol
    /// in scope (e.g. another class in the same file) if there is one,
    /// otherwise emit a standalone `TypeRef` for the later cross-file pass
    /// to link (spec.md §1 "emits unresolved references that a later pass
    /// links").
    fn resolve_type_name(&mut self, scope: ScopeId, name: &str, range: Span) -> Result<u64> {
        if let Some(sym) = self.scopes.resolve(scope, name) {
            return Ok(sym.node_id);
        }
        let mut metadata = Metadata::new();
        metadata.insert("is_type".into(), Attribute::Bool(true));
        self.emit_type_ref(scope, name, range, metadata)
    }

    /// Emit one class field: a Variable bound in the class scope, linked
    /// from the class via HAS_FIELD. Called by the visitor from inside
    /// `handle_class`'s `populate` callback, after the class node exists.
    pub fn add_field(
        &mut self,
        class_id: u64,
        class_scope: ScopeId,
        name: &str,
        range: Span,
        metadata: Metadata,
    ) -> Result<u64> {
        let id = self.emit_node(NodeKind::Variable, name, range, class_scope, metadata)?;
        self.bind_symbol(class_scope, name, id)?;
        self.sink.create_has_field(class_id, id, self.file_id)?;
        Ok(id)
    }

    /// Create a Function node, push its scope, emit parameters, let
    /// `populate_body` traverse the body, then attach everything left over
    /// via CONTAINS on pop.
    pub fn create_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        range: Span,
        params: &[ParamSpec],
        metadata: Metadata,
        populate_body: impl FnOnce(&mut Translate, u64, ScopeId),
    ) -> Result<u64> {
        let id = self.emit_node(NodeKind::Function, name, range, scope, metadata)?;
        self.bind_symbol(scope, name, id)?;

        let fn_scope = self.scopes.push(scope, false);
        for param in params {
            let pid = self.emit_node(
                NodeKind::Parameter,
                param.name.clone(),
                param.range,
                fn_scope,
                param.metadata.clone(),
            )?;
            self.sink.create_contains(id, pid, self.file_id)?;
            if param.is_typed {
                self.sink.create_has_field(id, pid, self.file_id)?;
            }
            self.bind_symbol(fn_scope, &param.name, pid)?;
        }

        self.function_stack.push(id);
        populate_body(self, id, fn_scope);
        self.function_stack.pop();
        self.end_scope(Some(id), fn_scope)?;
        Ok(id)
    }

    /// Push a block scope, let `populate` traverse its statements, then
    /// bubble anything left over into the enclosing scope. Blocks never own
    /// a node of their own.
    pub fn handle_block(&mut self, scope: ScopeId, populate: impl FnOnce(&mut Translate, ScopeId)) -> Result<()> {
        let block_scope = self.scopes.push(scope, false);
        populate(self, block_scope);
        self.end_scope(None, block_scope)
    }

    /// Evaluate the RHS under a fresh RHS scope, resolve or create the LHS
    /// variable, and emit ASSIGN + DATAFLOW from every RHS-referenced node
    /// to the LHS.
    pub fn handle_assignment(
        &mut self,
        scope: ScopeId,
        lhs_name: &str,
        lhs_range: Span,
        evaluate_rhs: impl FnOnce(&mut Translate, ScopeId),
    ) -> Result<u64> {
        let lhs_id = match self.scopes.resolve(scope, lhs_name) {
            Some(sym) => sym.node_id,
            None => {
                let id = self.emit_node(NodeKind::Variable, lhs_name, lhs_range, scope, Metadata::new())?;
                self.bind_symbol(scope, lhs_name, id)?;
                id
            }
        };
        self.assign_into(scope, lhs_id, lhs_range, evaluate_rhs)
    }

    /// Same as [`Translate::handle_assignment`], but for an LHS that is
    /// already resolved to a node id instead of a plain identifier — an
    /// attribute/member/subscript target, which `resolve_name_chain` (via
    /// `NameChainResolver`) resolves to a `FieldRef` rather than something
    /// bindable by name in the current scope.
    pub fn handle_assignment_to_node(
        &mut self,
        scope: ScopeId,
        lhs_id: u64,
        lhs_range: Span,
        evaluate_rhs: impl FnOnce(&mut Translate, ScopeId),
    ) -> Result<u64> {
        self.assign_into(scope, lhs_id, lhs_range, evaluate_rhs)
    }

    fn assign_into(&mut self, scope: ScopeId, lhs_id: u64, lhs_range: Span, evaluate_rhs: impl FnOnce(&mut Translate, ScopeId)) -> Result<u64> {
        let rhs_scope = self.scopes.push(scope, true);
        evaluate_rhs(self, rhs_scope);
        let rhs_vars = self.scopes.take_rhs_vars(rhs_scope);
        self.end_scope(None, rhs_scope)?;

        for rhs_id in rhs_vars {
            self.sink.create_assignment(rhs_id, lhs_id, lhs_range, self.file_id)?;
            self.sink.create_dataflow(rhs_id, lhs_id, self.file_id)?;
        }
        Ok(lhs_id)
    }

    /// Anchor an expression with no real name (a loop iterator, an `if`
    /// condition, a ternary) to a synthetic Variable so it can still be the
    /// target of DATAFLOW edges.
    pub fn handle_rhs_with_fake_variable(
        &mut self,
        scope: ScopeId,
        fake_name: &str,
        range: Span,
        evaluate_rhs: impl FnOnce(&mut Translate, ScopeId),
    ) -> Result<u64> {
        self.handle_assignment(scope, fake_name, range, evaluate_rhs)
    }

    /// Same as [`Translate::handle_rhs_with_fake_variable`] but for several
    /// expressions evaluated as one RHS tuple (e.g. a multi-value `return`);
    /// the caller evaluates each expression from within `evaluate_each`.
    pub fn handle_rhs_exprs_with_fake_variable(
        &mut self,
        scope: ScopeId,
        fake_name: &str,
        range: Span,
        evaluate_each: impl FnOnce(&mut Translate, ScopeId),
    ) -> Result<u64> {
        self.handle_assignment(scope, fake_name, range, evaluate_each)
    }

    /// Create a Conditional node. `else if` chains are expected to already
    /// be normalized by the caller into one `conditions` entry per test and
    /// one `branches` entry per arm (including a trailing `else`).
    pub fn handle_conditional(
        &mut self,
        scope: ScopeId,
        range: Span,
        conditions: Vec<ScopedThunk<'_>>,
        branches: Vec<ScopedThunk<'_>>,
    ) -> Result<u64> {
        let mut metadata = Metadata::new();
        metadata.insert("condition_count".into(), Attribute::Int(conditions.len() as i64));
        metadata.insert("branch_count".into(), Attribute::Int(branches.len() as i64));
        let id = self.emit_node(NodeKind::Conditional, crate::features::parsing::domain::synthetic_name::COND, range, scope, metadata)?;

        for cond in conditions {
            self.handle_rhs_with_fake_variable(scope, crate::features::parsing::domain::synthetic_name::COND, range, |t, s| cond(t, s))?;
        }
        for branch in branches {
            let branch_scope = self.scopes.push(scope, false);
            branch(self, branch_scope);
            self.end_scope(Some(id), branch_scope)?;
        }
        Ok(id)
    }

    /// Create a Loop node and traverse its body in a fresh scope. For-each,
    /// while, do-while and C-style for all collapse to this one call; the
    /// visitor is expected to have already evaluated init/cond/update via
    /// `handle_rhs_with_fake_variable` before calling this.
    pub fn handle_loop(&mut self, scope: ScopeId, range: Span, body: impl FnOnce(&mut Translate, ScopeId)) -> Result<u64> {
        let id = self.emit_node(NodeKind::Loop, "__loop__", range, scope, Metadata::new())?;
        let body_scope = self.scopes.push(scope, false);
        body(self, body_scope);
        self.end_scope(Some(id), body_scope)?;
        Ok(id)
    }

    /// Create a Call node, evaluate every argument under a fresh RHS scope,
    /// and emit CALLS from the enclosing Function (if any) to `callee_id`.
    pub fn handle_call(&mut self, scope: ScopeId, callee_id: u64, range: Span, args: Vec<ScopedThunk<'_>>) -> Result<u64> {
        self.handle_call_with_metadata(scope, callee_id, range, args, Metadata::new())
    }

    pub fn handle_call_with_metadata(
        &mut self,
        scope: ScopeId,
        callee_id: u64,
        range: Span,
        args: Vec<ScopedThunk<'_>>,
        metadata: Metadata,
    ) -> Result<u64> {
        let id = self.emit_node(NodeKind::Call, "__call__", range, scope, metadata)?;

        for arg in args {
            let arg_scope = self.scopes.push(scope, true);
            arg(self, arg_scope);
            let rhs_vars = self.scopes.take_rhs_vars(arg_scope);
            self.end_scope(Some(id), arg_scope)?;
            for rhs_id in rhs_vars {
                self.sink.create_dataflow(rhs_id, id, self.file_id)?;
            }
        }

        if let Some(&caller_fn) = self.function_stack.last() {
            self.sink
                .create_relation(Relation::new(caller_fn, callee_id, RelationKind::Calls, self.file_id).with_call_site(range))?;
        }
        if self.scopes.is_rhs(scope) {
            self.scopes.add_rhs_var(scope, id);
        }
        Ok(id)
    }

    /// Evaluate `expr` under an RHS scope and create a Return node.
    pub fn handle_return(&mut self, scope: ScopeId, range: Span, evaluate_expr: impl FnOnce(&mut Translate, ScopeId)) -> Result<u64> {
        let rhs_scope = self.scopes.push(scope, true);
        evaluate_expr(self, rhs_scope);
        let rhs_vars = self.scopes.take_rhs_vars(rhs_scope);
        self.end_scope(None, rhs_scope)?;

        let id = self.emit_node(NodeKind::Return, "__return__", range, scope, Metadata::new())?;
        for rhs_id in rhs_vars {
            self.sink.create_dataflow(rhs_id, id, self.file_id)?;
        }
        Ok(id)
    }

    /// Resolve `name` in `scope`'s chain, or create a fresh Variable if it
    /// is unbound. If inside an RHS scope, record the resolved id for the
    /// enclosing assignment to pick up.
    pub fn handle_identifier(&mut self, scope: ScopeId, name: &str, range: Span) -> Result<u64> {
        let id = match self.scopes.resolve(scope, name) {
            Some(sym) => sym.node_id,
            None => {
                let id = self.emit_node(NodeKind::Variable, name, range, scope, Metadata::new())?;
                self.bind_symbol(scope, name, id)?;
                id
            }
        };
        if self.scopes.is_rhs(scope) {
            self.scopes.add_rhs_var(scope, id);
        }
        Ok(id)
    }

    /// Emit a Literal node for a constant appearing in an expression
    /// position. Never bound as a symbol (literals have no name to
    /// resolve); if evaluated inside an RHS scope it still feeds
    /// data-flow like any other `handle_identifier` result.
    pub fn handle_literal(&mut self, scope: ScopeId, text: &str, range: Span) -> Result<u64> {
        let id = self.emit_node(NodeKind::Literal, text, range, scope, Metadata::new())?;
        if self.scopes.is_rhs(scope) {
            self.scopes.add_rhs_var(scope, id);
        }
        Ok(id)
    }

    /// Create a Throw node, evaluating the thrown expression under RHS
    /// first — modeled identically to `handle_return` since both anchor a
    /// control-transfer statement to whatever expression feeds it.
    pub fn handle_throw(&mut self, scope: ScopeId, range: Span, evaluate_expr: impl FnOnce(&mut Translate, ScopeId)) -> Result<u64> {
        let rhs_scope = self.scopes.push(scope, true);
        evaluate_expr(self, rhs_scope);
        let rhs_vars = self.scopes.take_rhs_vars(rhs_scope);
        self.end_scope(None, rhs_scope)?;

        let id = self.emit_node(NodeKind::Throw, "__throw__", range, scope, Metadata::new())?;
        for rhs_id in rhs_vars {
            self.sink.create_dataflow(rhs_id, id, self.file_id)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::infrastructure::InMemoryGraphSink;

    fn translate() -> (Translate, Arc<InMemoryGraphSink>) {
        let sink = Arc::new(InMemoryGraphSink::new());
        let translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        (translate, sink)
    }

    #[test]
    fn module_scope_and_function_attach_via_contains() {
        let (mut t, sink) = translate();
        let module = t.new_module_scope("pkg", Span::zero(), Metadata::new()).unwrap();
        let root = t.root_scope();
        t.create_function(root, "greet", Span::zero(), &[], Metadata::new(), |_, _, _| {}).unwrap();
        t.finish(module).unwrap();

        assert_eq!(sink.relations().len(), 1);
        let rel = &sink.relations()[0];
        assert_eq!(rel.from, module);
        assert_eq!(rel.label, RelationKind::Contains);
    }

    #[test]
    fn assignment_emits_assign_and_dataflow_from_each_rhs_var() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        t.handle_identifier(root, "y", Span::zero()).unwrap();
        let lhs = t
            .handle_assignment(root, "x", Span::zero(), |t, s| {
                t.handle_identifier(s, "y", Span::zero()).unwrap();
            })
            .unwrap();

        let assigns: Vec<_> = sink
            .relations()
            .into_iter()
            .filter(|r| r.label == RelationKind::Assign && r.to == lhs)
            .collect();
        let dataflows: Vec<_> = sink
            .relations()
            .into_iter()
            .filter(|r| r.label == RelationKind::Dataflow && r.to == lhs)
            .collect();
        assert_eq!(assigns.len(), 1);
        assert_eq!(dataflows.len(), 1);
    }

    #[test]
    fn duplicate_symbol_is_suffixed_not_fatal() {
        let (mut t, _sink) = translate();
        let root = t.root_scope();
        t.handle_identifier(root, "dup", Span::zero()).unwrap();
        // Force a second binding under the same name in the same scope.
        let id = t.emit_node(NodeKind::Variable, "dup", Span::zero(), root, Metadata::new()).unwrap();
        t.bind_symbol(root, "dup", id).unwrap();
        assert_eq!(t.scopes().resolve(root, "dup#2").unwrap().node_id, id);
    }

    #[test]
    fn conditional_records_condition_and_branch_counts() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let conditions: Vec<ScopedThunk> = vec![
            Box::new(|t: &mut Translate, s| {
                t.handle_identifier(s, "a", Span::zero()).unwrap();
            }),
            Box::new(|t: &mut Translate, s| {
                t.handle_identifier(s, "b", Span::zero()).unwrap();
            }),
        ];
        let branches: Vec<ScopedThunk> = vec![Box::new(|_, _| {}), Box::new(|_, _| {}), Box::new(|_, _| {})];
        let id = t.handle_conditional(root, Span::zero(), conditions, branches).unwrap();

        let node = sink.nodes().into_iter().find(|n| n.id == id).unwrap();
        assert!(matches!(node.metadata.get("condition_count"), Some(Attribute::Int(2))));
        assert!(matches!(node.metadata.get("branch_count"), Some(Attribute::Int(3))));
    }

    #[test]
    fn call_links_to_enclosing_function_with_call_site_range() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let callee = t.handle_identifier(root, "helper", Span::zero()).unwrap();
        let range = Span::new(3, 0, 3, 10);
        t.create_function(root, "caller", Span::zero(), &[], Metadata::new(), |t, _, fn_scope| {
            t.handle_call(fn_scope, callee, range, vec![]).unwrap();
        })
        .unwrap();

        let call = sink
            .relations()
            .into_iter()
            .find(|r| r.label == RelationKind::Calls)
            .expect("CALLS relation emitted");
        assert_eq!(call.to, callee);
        assert_eq!(call.call_site, Some(range));
    }

    #[test]
    fn import_is_resolvable_as_a_name_chain_head() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let mut meta = Metadata::new();
        meta.insert("importPath".into(), Attribute::Str("pkg.utils".into()));
        let import_id = t.handle_import(root, "utils", Span::zero(), meta).unwrap();
        assert_eq!(t.scopes().resolve(root, "utils").unwrap().node_id, import_id);
        assert!(sink.nodes().into_iter().any(|n| n.id == import_id && n.kind == NodeKind::Import));
    }

    #[test]
    fn literal_feeds_dataflow_like_any_rhs_reference() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let lhs = t
            .handle_assignment(root, "x", Span::zero(), |t, s| {
                t.handle_literal(s, "42", Span::zero()).unwrap();
            })
            .unwrap();
        assert!(sink
            .relations()
            .into_iter()
            .any(|r| r.label == RelationKind::Dataflow && r.to == lhs));
    }

    #[test]
    fn type_ref_is_not_bound_as_a_value_symbol() {
        let (mut t, _sink) = translate();
        let root = t.root_scope();
        t.emit_type_ref(root, "Comparable", Span::zero(), Metadata::new()).unwrap();
        assert!(t.scopes().resolve(root, "Comparable").is_none());
    }

    #[test]
    fn class_extends_known_sibling_class_emits_extends_relation() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let animal = t.handle_class(root, "Animal", Span::zero(), Metadata::new(), |_, _, _| {}).unwrap();

        let mut metadata = Metadata::new();
        metadata.insert("extends".into(), Attribute::Str("Animal".into()));
        let dog = t.handle_class(root, "Dog", Span::zero(), metadata, |_, _, _| {}).unwrap();

        assert!(sink
            .relations()
            .into_iter()
            .any(|r| r.label == RelationKind::Extends && r.from == dog && r.to == animal));
    }

    #[test]
    fn class_implements_unknown_interface_emits_type_ref_target() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let mut metadata = Metadata::new();
        metadata.insert("implements".into(), Attribute::StrList(vec!["Comparable".into()]));
        let dog = t.handle_class(root, "Dog", Span::zero(), metadata, |_, _, _| {}).unwrap();

        let implements_rel = sink
            .relations()
            .into_iter()
            .find(|r| r.label == RelationKind::Implements && r.from == dog)
            .expect("IMPLEMENTS relation emitted");
        let target = sink.node(implements_rel.to).expect("target node exists");
        assert_eq!(target.kind, NodeKind::TypeRef);
        assert_eq!(target.name, "Comparable");
    }

    #[test]
    fn finish_emits_import_relations_from_module_to_each_import() {
        let (mut t, sink) = translate();
        let root = t.root_scope();
        let mut meta = Metadata::new();
        meta.insert("importPath".into(), Attribute::Str("pkg.utils".into()));
        let import_id = t.handle_import(root, "utils", Span::zero(), meta).unwrap();
        let module = t.new_module_scope("pkg", Span::zero(), Metadata::new()).unwrap();
        t.finish(module).unwrap();

        assert!(sink
            .relations()
            .into_iter()
            .any(|r| r.label == RelationKind::Import && r.from == module && r.to == import_id));
    }
}
