//! Python `LanguageVisitor`.
//!
//! Grounded on the teacher's `plugins/python.rs`: `extract_function`'s
//! scope-stack heuristic for Method vs. Function vs. Lambda, `extract_class`
//! pulling `superclasses` before recursing into `body`, `extract_import`
//! branching on `import_statement` vs. `import_from_statement`,
//! `extract_assignment` skipping dotted (attribute) targets, and the
//! decorator-walk that collects preceding `decorator` siblings.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::{NameChainResolver, ParamSpec, Translate};
use crate::features::parsing::domain::{synthetic_name, ScopeId};
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Annotation, Attribute, Metadata};

use super::common::{push_annotation, settle, span, text, traverse_children};

pub struct PythonVisitor;

impl PythonVisitor {
    pub fn new() -> Self {
        Self
    }

    fn handle_decorated_definition(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut metadata = Metadata::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "decorator" {
                self.extract_decorator(&mut metadata, source, child);
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function_definition" => return self.handle_function(translate, source, child, scope, metadata),
                "class_definition" => return self.handle_class(translate, source, child, scope, metadata),
                _ => {}
            }
        }
        NO_NODE
    }

    fn extract_decorator(&self, metadata: &mut Metadata, source: &str, node: TsNode) {
        // `@name` or `@name(args)`; the decorator's only named child is the
        // identifier/attribute/call being applied.
        let Some(target) = node.named_child(0) else { return };
        let (name, call_node) = if target.kind() == "call" {
            (target.child_by_field_name("function"), Some(target))
        } else {
            (Some(target), None)
        };
        let Some(name_node) = name else { return };
        let mut annotation = Annotation::new(text(name_node, source));
        if let Some(call) = call_node {
            if let Some(args) = call.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for (i, arg) in args.named_children(&mut cursor).enumerate() {
                    annotation = annotation.with_argument(format!("arg{i}"), text(arg, source));
                }
            }
        }
        push_annotation(metadata, annotation);
    }

    fn handle_function(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId, mut metadata: Metadata) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);

        let is_async = node
            .prev_sibling()
            .map(|s| s.kind() == "async")
            .unwrap_or(false);
        if is_async {
            metadata.insert("is_async".into(), Attribute::Bool(true));
        }

        let params = self.collect_parameters(source, node);
        settle(translate.create_function(scope, name, span(node), &params, metadata, |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, fn_scope);
            }
        }))
    }

    fn collect_parameters(&self, source: &str, node: TsNode) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let Some(param_list) = node.child_by_field_name("parameters") else {
            return params;
        };
        let mut cursor = param_list.walk();
        for child in param_list.named_children(&mut cursor) {
            let (name_node, is_typed) = match child.kind() {
                "identifier" => (Some(child), false),
                "typed_parameter" => (child.named_child(0), true),
                "default_parameter" | "typed_default_parameter" => (child.child_by_field_name("name"), child.kind() == "typed_default_parameter"),
                "list_splat_pattern" | "dictionary_splat_pattern" => (child.named_child(0), false),
                _ => continue,
            };
            let Some(name_node) = name_node else { continue };
            let name = text(name_node, source);
            if name == "self" || name == "cls" {
                continue;
            }
            let mut spec = ParamSpec::new(name, span(child));
            if is_typed {
                spec = spec.typed();
            }
            params.push(spec);
        }
        params
    }

    fn handle_class(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId, mut metadata: Metadata) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);

        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut bases = Vec::new();
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                bases.push(text(base, source).to_string());
            }
            if let Some(first) = bases.first() {
                metadata.insert("extends".into(), Attribute::Str(first.clone()));
            }
            if bases.len() > 1 {
                metadata.insert("implements".into(), Attribute::StrList(bases[1..].to_vec()));
            }
        }

        settle(translate.handle_class(scope, name, span(node), metadata, |translate, _class_id, class_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, class_scope);
            }
        }))
    }

    fn handle_lambda(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let params = self.collect_parameters(source, node);
        settle(translate.create_function(scope, synthetic_name::LAMBDA, span(node), &params, Metadata::new(), |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                self.traverse_node(translate, source, body, fn_scope);
            }
        }))
    }

    fn handle_import(&self, translate: &mut Translate, source: &str, node: TsNode) -> u64 {
        let mut last = NO_NODE;
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "dotted_name" || child.kind() == "aliased_import" {
                        let path_node = if child.kind() == "aliased_import" { child.named_child(0).unwrap_or(child) } else { child };
                        let path = text(path_node, source);
                        let name = path.rsplit('.').next().unwrap_or(path);
                        let mut metadata = Metadata::new();
                        metadata.insert("importPath".into(), Attribute::Str(path.to_string()));
                        last = settle(translate.handle_import(translate.root_scope(), name, span(child), metadata));
                    }
                }
            }
            "import_from_statement" => {
                let module_path = node
                    .child_by_field_name("module_name")
                    .map(|n| text(n, source).to_string())
                    .unwrap_or_default();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "dotted_name" || child.kind() == "identifier" {
                        let imported = text(child, source);
                        if imported == module_path {
                            continue;
                        }
                        let full_path = if module_path.is_empty() {
                            imported.to_string()
                        } else {
                            format!("{module_path}.{imported}")
                        };
                        let mut metadata = Metadata::new();
                        metadata.insert("importPath".into(), Attribute::Str(full_path));
                        last = settle(translate.handle_import(translate.root_scope(), imported, span(child), metadata));
                    }
                }
            }
            _ => {}
        }
        last
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

        match left.kind() {
            "identifier" => {
                let name = text(left, source).to_string();
                settle(translate.handle_assignment(scope, &name, span(node), |translate, rhs_scope| {
                    self.traverse_node(translate, source, right, rhs_scope);
                }))
            }
            "attribute" => {
                let lhs_id = self.resolve_attribute(translate, source, left, scope);
                settle(translate.handle_assignment_to_node(scope, lhs_id, span(node), |translate, rhs_scope| {
                    self.traverse_node(translate, source, right, rhs_scope);
                }))
            }
            _ => {
                traverse_children(self, translate, source, right, scope);
                NO_NODE
            }
        }
    }

    /// Resolve a dotted `a.b.c` member-access chain, peeling identifiers
    /// right-to-left (spec.md §4.3 "Key algorithm").
    fn resolve_attribute(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut parts = Vec::new();
        let mut cursor = node;
        loop {
            match cursor.kind() {
                "attribute" => {
                    if let Some(attr) = cursor.child_by_field_name("attribute") {
                        parts.push(text(attr, source).to_string());
                    }
                    match cursor.child_by_field_name("object") {
                        Some(obj) => cursor = obj,
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

    fn handle_call(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(function) = node.child_by_field_name("function") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };

        let callee = match function.kind() {
            "attribute" => self.resolve_attribute(translate, source, function, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(function, source), span(function))),
            // Receiver is itself a call: `a.b().c()` — the inner call is
            // emitted first by this very recursion, and the outer callee
            // resolution chain is just its own result (spec.md §8 S2).
            _ => self.traverse_node(translate, source, function, scope),
        };

        let mut metadata = Metadata::new();
        if text(function, source) == "self" || matches!(function.kind(), "identifier") && text(function, source).chars().next().is_some_and(char::is_uppercase) {
            metadata.insert("is_constructor".into(), Attribute::Bool(true));
        }

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

        settle(translate.handle_call_with_metadata(scope, callee, span(node), thunks, metadata))
    }

    fn handle_if(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut conditions = Vec::new();
        let mut branches = Vec::new();
        self.collect_if_chain(source, node, &mut conditions, &mut branches);

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

    fn collect_if_chain<'a>(&self, source: &str, node: TsNode<'a>, conditions: &mut Vec<TsNode<'a>>, branches: &mut Vec<TsNode<'a>>) {
        let _ = source;
        if let Some(cond) = node.child_by_field_name("condition") {
            conditions.push(cond);
        }
        if let Some(consequence) = node.child_by_field_name("consequence") {
            branches.push(consequence);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "elif_clause" => {
                    if let Some(cond) = child.child_by_field_name("condition") {
                        conditions.push(cond);
                    }
                    if let Some(consequence) = child.child_by_field_name("consequence") {
                        branches.push(consequence);
                    }
                }
                "else_clause" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        branches.push(body);
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_for(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if let Some(iterable) = node.child_by_field_name("right") {
            settle(translate.handle_rhs_with_fake_variable(scope, synthetic_name::ITER, span(iterable), |translate, s| {
                self.traverse_node(translate, source, iterable, s);
            }));
        }
        settle(translate.handle_loop(scope, span(node), |translate, body_scope| {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    settle(translate.handle_identifier(body_scope, text(left, source), span(left)));
                }
            }
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, body_scope);
            }
        }))
    }

    fn handle_while(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if let Some(cond) = node.child_by_field_name("condition") {
            settle(translate.handle_rhs_with_fake_variable(scope, synthetic_name::COND, span(cond), |translate, s| {
                self.traverse_node(translate, source, cond, s);
            }));
        }
        settle(translate.handle_loop(scope, span(node), |translate, body_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, body_scope);
            }
        }))
    }

    fn handle_try(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        translate.handle_block(scope, |translate, block_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, block_scope);
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "except_clause" | "finally_clause" => {
                        traverse_children(self, translate, source, child, block_scope);
                    }
                    _ => {}
                }
            }
        })
        .ok();
        NO_NODE
    }

    fn handle_raise(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        settle(translate.handle_throw(scope, span(node), |translate, rhs_scope| {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                self.traverse_node(translate, source, child, rhs_scope);
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

impl Default for PythonVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageVisitor for PythonVisitor {
    fn language_tag(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn tree_sitter_language(&self) -> TsLanguage {
        tree_sitter_python::language()
    }

    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if translate.is_cancelled() {
            return NO_NODE;
        }
        match node.kind() {
            "decorated_definition" => self.handle_decorated_definition(translate, source, node, scope),
            "function_definition" => self.handle_function(translate, source, node, scope, Metadata::new()),
            "class_definition" => self.handle_class(translate, source, node, scope, Metadata::new()),
            "lambda" => self.handle_lambda(translate, source, node, scope),
            "import_statement" | "import_from_statement" => self.handle_import(translate, source, node),
            "assignment" => self.handle_assignment(translate, source, node, scope),
            "call" => self.handle_call(translate, source, node, scope),
            "if_statement" => self.handle_if(translate, source, node, scope),
            "for_statement" => self.handle_for(translate, source, node, scope),
            "while_statement" => self.handle_while(translate, source, node, scope),
            "try_statement" => self.handle_try(translate, source, node, scope),
            "raise_statement" => self.handle_raise(translate, source, node, scope),
            "return_statement" => self.handle_return(translate, source, node, scope),
            "attribute" => self.resolve_attribute(translate, source, node, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(node, source), span(node))),
            "string" | "integer" | "float" | "true" | "false" | "none" => settle(translate.handle_literal(scope, text(node, source), span(node))),
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
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let sink = Arc::new(InMemoryGraphSink::new());
        let mut translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        let visitor = PythonVisitor::new();
        let root_scope = translate.root_scope();
        visitor.traverse_node(&mut translate, source, tree.root_node(), root_scope);
        let module = translate.new_module_scope("mod", span(tree.root_node()), Metadata::new()).unwrap();
        translate.finish(module).unwrap();
        (sink, module)
    }

    #[test]
    fn function_definition_emits_function_node() {
        let (sink, _module) = parse_and_translate("def greet(name):\n    return name\n");
        assert!(sink.nodes().into_iter().any(|n| n.name == "greet"));
    }

    #[test]
    fn class_with_single_base_records_extends() {
        let (sink, _module) = parse_and_translate("class Dog(Animal):\n    pass\n");
        let class = sink.nodes().into_iter().find(|n| n.name == "Dog").unwrap();
        assert_eq!(class.metadata.get("extends").and_then(Attribute::as_str), Some("Animal"));
    }

    #[test]
    fn decorator_is_recorded_as_annotation() {
        let (sink, _module) = parse_and_translate("@staticmethod\ndef f():\n    pass\n");
        let f = sink.nodes().into_iter().find(|n| n.name == "f").unwrap();
        let list = f.metadata.get("annotations").and_then(Attribute::as_str_list).unwrap();
        assert!(list[0].contains("staticmethod"));
    }

    #[test]
    fn import_from_records_import_path() {
        let (sink, _module) = parse_and_translate("from pkg.util import helper\n");
        let import = sink.nodes().into_iter().find(|n| n.name == "helper").unwrap();
        assert_eq!(import.metadata.get("importPath").and_then(Attribute::as_str), Some("pkg.util.helper"));
    }

    #[test]
    fn self_constructor_call_is_flagged() {
        let (sink, _module) = parse_and_translate("x = Owner()\n");
        let call = sink
            .nodes()
            .into_iter()
            .find(|n| n.metadata.get("is_constructor").and_then(Attribute::as_bool) == Some(true));
        assert!(call.is_some());
    }
}
