//! Name-chain resolution: turning a dotted/member-access token sequence
//! (`a.b.c`) into a node id, descending the head symbol's `fields` map one
//! segment at a time and materializing a `FieldRef` for any hop seen for
//! the first time.

use crate::features::parsing::domain::{NodeKind, ScopeId};
use crate::shared::models::{Attribute, CodegraphError, Metadata, Result, Span};

use super::translate::Translate;

pub struct NameChainResolver;

impl NameChainResolver {
    /// Resolve `parts` (e.g. `["a", "b", "c"]` for `a.b.c`) starting in
    /// `scope`. Never fails on an unresolved name — unresolved segments get
    /// fresh reference nodes instead, per the "never unwinding for normal
    /// control flow" design. Only genuinely malformed input (an empty
    /// chain) is an error.
    pub fn resolve(translate: &mut Translate, scope: ScopeId, parts: &[String], range: Span) -> Result<u64> {
        let (head, rest) = parts
            .split_first()
            .ok_or_else(|| CodegraphError::internal("resolve_name_chain called with an empty chain"))?;

        let head_id = Self::resolve_head(translate, scope, head, range)?;
        if rest.is_empty() {
            return Ok(head_id);
        }

        let mut fallback_ids = Vec::with_capacity(rest.len());
        for _ in rest {
            fallback_ids.push(translate.allocate_id()?);
        }

        let descended = translate
            .scopes_mut()
            .descend_fields_with_ids(scope, head, rest, &fallback_ids);

        let terminal = match descended {
            Some((terminal, created)) => {
                for (name, id) in created {
                    let mut metadata = Metadata::new();
                    metadata.insert("owner".into(), Attribute::Int(head_id as i64));
                    translate.emit_node_with_id(id, NodeKind::FieldRef, name, range, scope, metadata)?;
                }
                terminal
            }
            // `head` resolved to something (e.g. an import or a synthetic
            // `this`) that never became a bindable Symbol; fall back to a
            // standalone unresolved reference for the whole remaining tail.
            None => {
                let joined = rest.join(".");
                let mut metadata = Metadata::new();
                metadata.insert("unresolved".into(), Attribute::Bool(true));
                metadata.insert("owner".into(), Attribute::Int(head_id as i64));
                translate.emit_node(NodeKind::FieldRef, joined, range, scope, metadata)?
            }
        };

        if translate.scopes().is_rhs(scope) {
            translate.scopes_mut().add_rhs_var(scope, terminal);
        }
        Ok(terminal)
    }

    fn resolve_head(translate: &mut Translate, scope: ScopeId, head: &str, range: Span) -> Result<u64> {
        match head {
            "this" | "self" => Self::bind_receiver(translate, "this", false, range),
            "super" => Self::bind_receiver(translate, "super", true, range),
            _ => translate.handle_identifier(scope, head, range),
        }
    }

    /// `this`/`self`/`super` resolve to a synthetic Variable bound in the
    /// enclosing class's scope rather than the use-site scope, so every
    /// reference within one class collapses to the same node.
    fn bind_receiver(translate: &mut Translate, canonical_name: &str, is_super: bool, range: Span) -> Result<u64> {
        let Some((_, class_scope)) = translate.current_class() else {
            // No enclosing class (e.g. a free function using `self`) —
            // treat it like any other unbound identifier in the current
            // scope rather than guessing at a class that doesn't exist.
            return translate.handle_identifier(translate.root_scope(), canonical_name, range);
        };

        if let Some(sym) = translate.scopes().resolve(class_scope, canonical_name) {
            return Ok(sym.node_id);
        }

        let mut metadata = Metadata::new();
        let flag = if is_super { "is_super" } else { "is_this" };
        metadata.insert(flag.into(), Attribute::Bool(true));
        let id = translate.emit_node(NodeKind::Variable, canonical_name, range, class_scope, metadata)?;
        translate.bind_symbol(class_scope, canonical_name, id)?;
        Ok(id)
    }
}
