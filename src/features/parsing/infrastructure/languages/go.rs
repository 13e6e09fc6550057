//! Go `LanguageVisitor`.
//!
//! Grounded on the teacher's `plugins/go.rs`: `function_declaration` vs.
//! `method_declaration`'s extra `receiver` field, `type_spec` covering both
//! struct and interface declarations, `field_declaration_list` /
//! `method_spec_list` member iteration, and `import_spec_list` /
//! `import_spec` path extraction.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::{NameChainResolver, ParamSpec, Translate};
use crate::features::parsing::domain::{synthetic_name, ScopeId};
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Attribute, Metadata};

use super::common::{settle, span, text, traverse_children};

pub struct GoVisitor;

impl GoVisitor {
    pub fn new() -> Self {
        Self
    }

    fn collect_parameters(&self, source: &str, node: TsNode, field: &str) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let Some(param_list) = node.child_by_field_name(field) else { return params };
        let mut cursor = param_list.walk();
        for child in param_list.named_children(&mut cursor) {
            if child.kind() != "parameter_declaration" && child.kind() != "variadic_parameter_declaration" {
                continue;
            }
            let has_type = child.child_by_field_name("type").is_some();
            let mut names: Vec<TsNode> = Vec::new();
            let mut icursor = child.walk();
            for name_node in child.children_by_field_name("name", &mut icursor) {
                names.push(name_node);
            }
            if names.is_empty() {
                continue;
            }
            for name_node in names {
                let mut spec = ParamSpec::new(text(name_node, source), span(name_node));
                if has_type {
                    spec = spec.typed();
                }
                params.push(spec);
            }
        }
        params
    }

    fn handle_function(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let params = self.collect_parameters(source, node, "parameters");
        settle(translate.create_function(scope, name, span(node), &params, Metadata::new(), |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, fn_scope);
            }
        }))
    }

    fn handle_method(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let mut metadata = Metadata::new();
        if let Some(receiver) = node.child_by_field_name("receiver") {
            let receiver_name = receiver
                .named_child(0)
                .and_then(|decl| decl.child_by_field_name("name"))
                .map(|n| text(n, source).to_string())
                .unwrap_or_else(|| text(receiver, source).to_string());
            metadata.insert("receiver".into(), Attribute::Str(receiver_name));
        }
        let params = self.collect_parameters(source, node, "parameters");
        settle(translate.create_function(scope, name, span(node), &params, metadata, |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, fn_scope);
            }
        }))
    }

    fn handle_type_spec(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let Some(type_node) = node.child_by_field_name("type") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };

        let mut metadata = Metadata::new();
        match type_node.kind() {
            "struct_type" => {
                metadata.insert("is_struct".into(), Attribute::Bool(true));
            }
            "interface_type" => {
                metadata.insert("is_interface".into(), Attribute::Bool(true));
            }
            _ => {
                // A plain type alias (`type ID = string`, etc.) — represent
                // it as a class-shaped node with no members rather than
                // dropping it, so downstream relation kinds (HAS_FIELD,
                // IMPLEMENTS) stay meaningful if this type gains methods.
                metadata.insert("is_alias".into(), Attribute::Bool(true));
            }
        }

        settle(translate.handle_class(scope, name, span(node), metadata, |translate, class_id, class_scope| {
            match type_node.kind() {
                "struct_type" => self.handle_struct_fields(translate, source, type_node, class_id, class_scope),
                "interface_type" => self.handle_interface_methods(translate, source, type_node, class_id, class_scope),
                _ => {}
            }
        }))
    }

    fn handle_struct_fields(&self, translate: &mut Translate, source: &str, struct_node: TsNode, class_id: u64, class_scope: ScopeId) {
        let Some(field_list) = struct_node.child_by_field_name("fields") else { return };
        let mut cursor = field_list.walk();
        for field in field_list.named_children(&mut cursor) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let mut icursor = field.walk();
            for name_node in field.children_by_field_name("name", &mut icursor) {
                let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(name_node), Metadata::new());
            }
        }
    }

    fn handle_interface_methods(&self, translate: &mut Translate, source: &str, iface_node: TsNode, class_id: u64, class_scope: ScopeId) {
        let mut cursor = iface_node.walk();
        for spec in iface_node.named_children(&mut cursor) {
            if spec.kind() != "method_spec" {
                continue;
            }
            let Some(name_node) = spec.child_by_field_name("name") else { continue };
            let mut metadata = Metadata::new();
            metadata.insert("is_interface_method".into(), Attribute::Bool(true));
            let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(spec), metadata);
        }
    }

    fn handle_import_decl(&self, translate: &mut Translate, source: &str, node: TsNode) -> u64 {
        let mut last = NO_NODE;
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            if spec.kind() == "import_spec_list" {
                let mut icursor = spec.walk();
                for inner in spec.named_children(&mut icursor) {
                    if inner.kind() == "import_spec" {
                        last = self.emit_import_spec(translate, source, inner);
                    }
                }
            } else if spec.kind() == "import_spec" {
                last = self.emit_import_spec(translate, source, spec);
            }
        }
        last
    }

    fn emit_import_spec(&self, translate: &mut Translate, source: &str, spec: TsNode) -> u64 {
        let Some(path_node) = spec.child_by_field_name("path") else { return NO_NODE };
        let path = text(path_node, source).trim_matches('"').to_string();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let mut metadata = Metadata::new();
        metadata.insert("importPath".into(), Attribute::Str(path));
        settle(translate.handle_import(translate.root_scope(), &name, span(spec), metadata))
    }

    fn resolve_selector(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut parts = Vec::new();
        let mut cursor = node;
        loop {
            match cursor.kind() {
                "selector_expression" => {
                    if let Some(field) = cursor.child_by_field_name("field") {
                        parts.push(text(field, source).to_string());
                    }
                    match cursor.child_by_field_name("operand") {
                        Some(operand) => cursor = operand,
                        None => break,
                    }
                }
                _ => {
                    parts.push(text(cursor, source).to_string());
                    break;
                }
            }
        }
        parts.reverse();
        if parts.is_empty() {
            return NO_NODE;
        }
        settle(NameChainResolver::resolve(translate, scope, &parts, span(node)))
    }

    fn handle_assignment(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(left) = node.child_by_field_name("left") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let Some(right) = node.child_by_field_name("right") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        // Go allows `a, b := f()` multi-assign; only the first target on
        // each side is modeled, mirroring the single-target assumption the
        // rest of this translation layer makes.
        let first_left = left.named_child(0).unwrap_or(left);
        let first_right = right.named_child(0).unwrap_or(right);
        match first_left.kind() {
            "identifier" => {
                let name = text(first_left, source).to_string();
                settle(translate.handle_assignment(scope, &name, span(node), |translate, rhs_scope| {
                    self.traverse_node(translate, source, first_right, rhs_scope);
                }))
            }
            "selector_expression" => {
                let lhs_id = self.resolve_selector(translate, source, first_left, scope);
                settle(translate.handle_assignment_to_node(scope, lhs_id, span(node), |translate, rhs_scope| {
                    self.traverse_node(translate, source, first_right, rhs_scope);
                }))
            }
            _ => {
                self.traverse_node(translate, source, first_right, scope);
                NO_NODE
            }
        }
    }

    fn handle_call(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(function) = node.child_by_field_name("function") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let callee = match function.kind() {
            "selector_expression" => self.resolve_selector(translate, source, function, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(function, source), span(function))),
            _ => self.traverse_node(translate, source, function, scope),
        };
        let args: Vec<TsNode> = node
            .child_by_field_name("arguments")
            .map(|a| {
                let mut cursor = a.walk();
                a.named_children(&mut cursor).collect()
            })
            .unwrap_or_default();
        let thunks: Vec<Box<dyn FnOnce(&mut Translate, ScopeId) + '_>> = args
            .into_iter()
            .map(|arg| -> Box<dyn FnOnce(&mut Translate, ScopeId) + '_> {
                Box::new(move |translate: &mut Translate, s: ScopeId| {
                    self.traverse_node(translate, source, arg, s);
                })
            })
            .collect();
        settle(translate.handle_call(scope, callee, span(node), thunks))
    }

    fn handle_if(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut conditions = Vec::new();
        let mut branches = Vec::new();
        self.collect_if_chain(node, &mut conditions, &mut branches);
        let cond_thunks: Vec<Box<dyn FnOnce(&mut Translate, ScopeId) + '_>> = conditions
            .into_iter()
            .map(|cond| -> Box<dyn FnOnce(&mut Translate, ScopeId) + '_> {
                Box::new(move |translate: &mut Translate, s: ScopeId| {
                    self.traverse_node(translate, source, cond, s);
                })
            })
            .collect();
        let branch_thunks: Vec<Box<dyn FnOnce(&mut Translate, ScopeId) + '_>> = branches
            .into_iter()
            .map(|body| -> Box<dyn FnOnce(&mut Translate, ScopeId) + '_> {
                Box::new(move |translate: &mut Translate, s: ScopeId| {
                    traverse_children(self, translate, source, body, s);
                })
            })
            .collect();
        settle(translate.handle_conditional(scope, span(node), cond_thunks, branch_thunks))
    }

    fn collect_if_chain<'a>(&self, node: TsNode<'a>, conditions: &mut Vec<TsNode<'a>>, branches: &mut Vec<TsNode<'a>>) {
        if let Some(cond) = node.child_by_field_name("condition") {
            conditions.push(cond);
        }
        if let Some(consequence) = node.child_by_field_name("consequence") {
            branches.push(consequence);
        }
        if let Some(alt) = node.child_by_field_name("alternative") {
            if alt.kind() == "if_statement" {
                self.collect_if_chain(alt, conditions, branches);
            } else {
                branches.push(alt);
            }
        }
    }

    fn handle_for(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        // `range` clauses carry their own scan-forward; plain `for` loops
        // (with init/cond/update children or none at all, the infinite
        // `for {}` form) just traverse whatever they have.
        if let Some(range_node) = node.child_by_field_name("right") {
            settle(translate.handle_rhs_with_fake_variable(scope, synthetic_name::ITER, span(range_node), |translate, s| {
                self.traverse_node(translate, source, range_node, s);
            }));
        }
        settle(translate.handle_loop(scope, span(node), |translate, body_scope| {
            if let Some(left) = node.child_by_field_name("left") {
                let mut cursor = left.walk();
                for ident in left.named_children(&mut cursor) {
                    if ident.kind() == "identifier" {
                        settle(translate.handle_identifier(body_scope, text(ident, source), span(ident)));
                    }
                }
            }
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, body_scope);
            } else {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "block" {
                        traverse_children(self, translate, source, child, body_scope);
                    }
                }
            }
        }))
    }

    fn handle_return(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        settle(translate.handle_return(scope, span(node), |translate, rhs_scope| {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                self.traverse_node(translate, source, child, rhs_scope);
            }
        }))
    }
}

impl Default for GoVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageVisitor for GoVisitor {
    fn language_tag(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn tree_sitter_language(&self) -> TsLanguage {
        tree_sitter_go::language()
    }

    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if translate.is_cancelled() {
            return NO_NODE;
        }
        match node.kind() {
            "function_declaration" => self.handle_function(translate, source, node, scope),
            "method_declaration" => self.handle_method(translate, source, node, scope),
            "type_spec" => self.handle_type_spec(translate, source, node, scope),
            "import_declaration" => self.handle_import_decl(translate, source, node),
            "assignment_statement" | "short_var_declaration" => self.handle_assignment(translate, source, node, scope),
            "call_expression" => self.handle_call(translate, source, node, scope),
            "if_statement" => self.handle_if(translate, source, node, scope),
            "for_statement" => self.handle_for(translate, source, node, scope),
            "return_statement" => self.handle_return(translate, source, node, scope),
            "selector_expression" => self.resolve_selector(translate, source, node, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(node, source), span(node))),
            "interpreted_string_literal" | "raw_string_literal" | "int_literal" | "float_literal" | "true" | "false" | "nil" | "rune_literal" => {
                settle(translate.handle_literal(scope, text(node, source), span(node)))
            }
            "comment" => NO_NODE,
            _ => {
                traverse_children(self, translate, source, node, scope);
                NO_NODE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::infrastructure::InMemoryGraphSink;
    use crate::shared::utils::CancellationToken;
    use std::sync::Arc;
    use tree_sitter::Parser;

    fn parse_and_translate(source: &str) -> (Arc<InMemoryGraphSink>, u64) {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let sink = Arc::new(InMemoryGraphSink::new());
        let mut translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        let visitor = GoVisitor::new();
        let root_scope = translate.root_scope();
        visitor.traverse_node(&mut translate, source, tree.root_node(), root_scope);
        let module = translate.new_module_scope("mod", span(tree.root_node()), Metadata::new()).unwrap();
        translate.finish(module).unwrap();
        (sink, module)
    }

    #[test]
    fn function_declaration_emits_function_node() {
        let (sink, _) = parse_and_translate("package main\nfunc Greet(name string) string {\n\treturn name\n}\n");
        assert!(sink.nodes().into_iter().any(|n| n.name == "Greet"));
    }

    #[test]
    fn method_declaration_records_receiver() {
        let (sink, _) = parse_and_translate("package main\nfunc (d *Dog) Bark() {}\n");
        let method = sink.nodes().into_iter().find(|n| n.name == "Bark").unwrap();
        assert_eq!(method.metadata.get("receiver").and_then(Attribute::as_str), Some("d"));
    }

    #[test]
    fn struct_type_spec_records_fields() {
        let (sink, _) = parse_and_translate("package main\ntype Dog struct {\n\tName string\n}\n");
        let dog = sink.nodes().into_iter().find(|n| n.name == "Dog").unwrap();
        assert_eq!(dog.metadata.get("is_struct").and_then(Attribute::as_bool), Some(true));
        assert!(sink.nodes().into_iter().any(|n| n.name == "Name"));
    }

    #[test]
    fn import_spec_records_path() {
        let (sink, _) = parse_and_translate("package main\nimport \"fmt\"\n");
        let import = sink.nodes().into_iter().find(|n| n.name == "fmt").unwrap();
        assert_eq!(import.metadata.get("importPath").and_then(Attribute::as_str), Some("fmt"));
    }
}
