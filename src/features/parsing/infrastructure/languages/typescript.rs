//! TypeScript/JavaScript `LanguageVisitor`.
//!
//! Grounded on the teacher's `plugins/typescript.rs`: the `class_declaration`
//! / `interface_declaration` / `enum_declaration` dispatch table, `heritage`
//! / `extends_clause` / `implements_clause` walking, `variable_declarator`
//! iteration for both `lexical_declaration` and plain `variable_declaration`,
//! and decorator siblings preceding a class or method.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::{NameChainResolver, ParamSpec, Translate};
use crate::features::parsing::domain::{synthetic_name, ScopeId};
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Annotation, Attribute, Metadata};

use super::common::{push_annotation, settle, span, text, traverse_children};

pub struct TypeScriptVisitor;

impl TypeScriptVisitor {
    pub fn new() -> Self {
        Self
    }

    fn collect_decorators(&self, metadata: &mut Metadata, source: &str, node: TsNode) {
        let mut sibling = node.prev_sibling();
        let mut decorators = Vec::new();
        while let Some(s) = sibling {
            if s.kind() == "decorator" {
                decorators.push(s);
                sibling = s.prev_sibling();
            } else {
                break;
            }
        }
        for decorator in decorators.into_iter().rev() {
            let Some(target) = decorator.named_child(0) else { continue };
            let (name, call_node) = if target.kind() == "call_expression" {
                (target.child_by_field_name("function"), Some(target))
            } else {
                (Some(target), None)
            };
            let Some(name_node) = name else { continue };
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
    }

    fn extract_heritage(&self, metadata: &mut Metadata, source: &str, node: TsNode) {
        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if let Some(heritage) = node.child_by_field_name("heritage") {
            self.walk_heritage(&mut extends, &mut implements, source, heritage);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_heritage" | "extends_clause" | "implements_clause" => {
                    self.walk_heritage(&mut extends, &mut implements, source, child);
                }
                _ => {}
            }
        }
        if let Some(first) = extends.first() {
            metadata.insert("extends".into(), Attribute::Str(first.clone()));
        }
        if !implements.is_empty() {
            metadata.insert("implements".into(), Attribute::StrList(implements));
        }
    }

    fn walk_heritage(&self, extends: &mut Vec<String>, implements: &mut Vec<String>, source: &str, node: TsNode) {
        match node.kind() {
            "extends_clause" => {
                let mut cursor = node.walk();
                for t in node.named_children(&mut cursor) {
                    extends.push(text(t, source).to_string());
                }
            }
            "implements_clause" => {
                let mut cursor = node.walk();
                for t in node.named_children(&mut cursor) {
                    implements.push(text(t, source).to_string());
                }
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk_heritage(extends, implements, source, child);
                }
            }
        }
    }

    fn handle_class(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let mut metadata = Metadata::new();
        self.collect_decorators(&mut metadata, source, node);
        self.extract_heritage(&mut metadata, source, node);

        settle(translate.handle_class(scope, name, span(node), metadata, |translate, class_id, class_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                self.handle_class_body(translate, source, body, class_id, class_scope);
            }
        }))
    }

    fn handle_class_body(&self, translate: &mut Translate, source: &str, body: TsNode, class_id: u64, class_scope: ScopeId) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_definition" => {
                    self.handle_method(translate, source, member, class_scope);
                }
                "public_field_definition" | "field_definition" => {
                    let Some(name_node) = member.child_by_field_name("name") else { continue };
                    let mut metadata = Metadata::new();
                    self.collect_decorators(&mut metadata, source, member);
                    if translate.add_field(class_id, class_scope, text(name_node, source), span(member), metadata).is_err() {
                        continue;
                    }
                    if let Some(value) = member.child_by_field_name("value") {
                        self.traverse_node(translate, source, value, class_scope);
                    }
                }
                _ => traverse_children(self, translate, source, member, class_scope),
            }
        }
    }

    fn collect_parameters(&self, source: &str, node: TsNode) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let Some(param_list) = node.child_by_field_name("parameters") else { return params };
        let mut cursor = param_list.walk();
        for child in param_list.named_children(&mut cursor) {
            let (name_node, is_typed) = match child.kind() {
                "identifier" => (Some(child), false),
                "required_parameter" | "optional_parameter" => {
                    let pat = child.child_by_field_name("pattern");
                    (pat, child.child_by_field_name("type").is_some())
                }
                _ => continue,
            };
            let Some(name_node) = name_node else { continue };
            if name_node.kind() != "identifier" && name_node.kind() != "this" {
                continue;
            }
            let name = text(name_node, source);
            if name == "this" {
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

    fn handle_method(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let mut metadata = Metadata::new();
        self.collect_decorators(&mut metadata, source, node);
        if name == "constructor" {
            metadata.insert("is_constructor".into(), Attribute::Bool(true));
        }
        let params = self.collect_parameters(source, node);
        settle(translate.create_function(scope, name, span(node), &params, metadata, |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, fn_scope);
            }
        }))
    }

    fn handle_function(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let name = node
            .child_by_field_name("name")
            .map(|n| text(n, source).to_string())
            .unwrap_or_else(|| synthetic_name::LAMBDA.to_string());
        let params = self.collect_parameters(source, node);
        settle(translate.create_function(scope, name, span(node), &params, Metadata::new(), |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                if body.kind() == "statement_block" {
                    traverse_children(self, translate, source, body, fn_scope);
                } else {
                    self.traverse_node(translate, source, body, fn_scope);
                }
            }
        }))
    }

    fn handle_variable_declarator(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else { return NO_NODE };
        if name_node.kind() != "identifier" {
            return NO_NODE;
        }
        let name = text(name_node, source).to_string();
        if let Some(value) = node.child_by_field_name("value") {
            settle(translate.handle_assignment(scope, &name, span(node), |translate, rhs_scope| {
                self.traverse_node(translate, source, value, rhs_scope);
            }))
        } else {
            settle(translate.handle_identifier(scope, &name, span(node)))
        }
    }

    fn handle_declaration_list(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut last = NO_NODE;
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() == "variable_declarator" {
                last = self.handle_variable_declarator(translate, source, declarator, scope);
            }
        }
        last
    }

    fn handle_import(&self, translate: &mut Translate, source: &str, node: TsNode) -> u64 {
        let source_path = node
            .child_by_field_name("source")
            .map(|n| text(n, source).trim_matches(|c| c == '"' || c == '\'').to_string())
            .unwrap_or_default();
        let mut last = NO_NODE;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_clause" => {
                    last = self.handle_import_clause(translate, source, child, &source_path);
                }
                _ => {}
            }
        }
        last
    }

    fn handle_import_clause(&self, translate: &mut Translate, source: &str, node: TsNode, source_path: &str) -> u64 {
        let mut last = NO_NODE;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    last = self.emit_import(translate, text(child, source), span(child), source_path);
                }
                "named_imports" => {
                    let mut icursor = child.walk();
                    for spec in child.named_children(&mut icursor) {
                        if spec.kind() == "import_specifier" {
                            if let Some(name_node) = spec.child_by_field_name("name") {
                                last = self.emit_import(translate, text(name_node, source), span(spec), source_path);
                            }
                        }
                    }
                }
                "namespace_import" => {
                    if let Some(name_node) = child.named_child(0) {
                        last = self.emit_import(translate, text(name_node, source), span(child), source_path);
                    }
                }
                _ => {}
            }
        }
        last
    }

    fn emit_import(&self, translate: &mut Translate, name: &str, range: crate::shared::models::Span, source_path: &str) -> u64 {
        let mut metadata = Metadata::new();
        metadata.insert("importPath".into(), Attribute::Str(source_path.to_string()));
        settle(translate.handle_import(translate.root_scope(), name, range, metadata))
    }

    fn resolve_member(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut parts = Vec::new();
        let mut cursor = node;
        loop {
            match cursor.kind() {
                "member_expression" => {
                    if let Some(prop) = cursor.child_by_field_name("property") {
                        parts.push(text(prop, source).to_string());
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
            "member_expression" => self.resolve_member(translate, source, function, scope),
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

    fn handle_new_expression(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(constructor) = node.child_by_field_name("constructor") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let callee = settle(translate.handle_identifier(scope, text(constructor, source), span(constructor)));
        let mut metadata = Metadata::new();
        metadata.insert("is_constructor".into(), Attribute::Bool(true));
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

    fn handle_for_in(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
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

    fn handle_for(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        settle(translate.handle_loop(scope, span(node), |translate, body_scope| {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                self.traverse_node(translate, source, child, body_scope);
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
        translate
            .handle_block(scope, |translate, block_scope| {
                if let Some(body) = node.child_by_field_name("body") {
                    traverse_children(self, translate, source, body, block_scope);
                }
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if matches!(child.kind(), "catch_clause" | "finally_clause") {
                        traverse_children(self, translate, source, child, block_scope);
                    }
                }
            })
            .ok();
        NO_NODE
    }

    fn handle_throw(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
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

impl Default for TypeScriptVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageVisitor for TypeScriptVisitor {
    fn language_tag(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx", "mjs"]
    }

    fn tree_sitter_language(&self) -> TsLanguage {
        tree_sitter_typescript::language_typescript()
    }

    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if translate.is_cancelled() {
            return NO_NODE;
        }
        match node.kind() {
            "class_declaration" | "class" => self.handle_class(translate, source, node, scope),
            "interface_declaration" => self.handle_class(translate, source, node, scope),
            "function_declaration" | "function" | "arrow_function" | "generator_function_declaration" => {
                self.handle_function(translate, source, node, scope)
            }
            "method_definition" => self.handle_method(translate, source, node, scope),
            "import_statement" => self.handle_import(translate, source, node),
            "lexical_declaration" | "variable_declaration" => self.handle_declaration_list(translate, source, node, scope),
            "variable_declarator" => self.handle_variable_declarator(translate, source, node, scope),
            "assignment_expression" => {
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
                    "member_expression" => {
                        let lhs_id = self.resolve_member(translate, source, left, scope);
                        settle(translate.handle_assignment_to_node(scope, lhs_id, span(node), |translate, rhs_scope| {
                            self.traverse_node(translate, source, right, rhs_scope);
                        }))
                    }
                    _ => {
                        self.traverse_node(translate, source, right, scope);
                        NO_NODE
                    }
                }
            }
            "call_expression" => self.handle_call(translate, source, node, scope),
            "new_expression" => self.handle_new_expression(translate, source, node, scope),
            "if_statement" => self.handle_if(translate, source, node, scope),
            "for_in_statement" => self.handle_for_in(translate, source, node, scope),
            "for_statement" => self.handle_for(translate, source, node, scope),
            "while_statement" | "do_statement" => self.handle_while(translate, source, node, scope),
            "try_statement" => self.handle_try(translate, source, node, scope),
            "throw_statement" => self.handle_throw(translate, source, node, scope),
            "return_statement" => self.handle_return(translate, source, node, scope),
            "member_expression" => self.resolve_member(translate, source, node, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(node, source), span(node))),
            "string" | "number" | "true" | "false" | "null" | "undefined" | "template_string" => {
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
        parser.set_language(&tree_sitter_typescript::language_typescript()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let sink = Arc::new(InMemoryGraphSink::new());
        let mut translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        let visitor = TypeScriptVisitor::new();
        let root_scope = translate.root_scope();
        visitor.traverse_node(&mut translate, source, tree.root_node(), root_scope);
        let module = translate.new_module_scope("mod", span(tree.root_node()), Metadata::new()).unwrap();
        translate.finish(module).unwrap();
        (sink, module)
    }

    #[test]
    fn class_with_extends_and_implements() {
        let (sink, _) = parse_and_translate("class Dog extends Animal implements Comparable, Serializable {}\n");
        let class = sink.nodes().into_iter().find(|n| n.name == "Dog").unwrap();
        assert_eq!(class.metadata.get("extends").and_then(Attribute::as_str), Some("Animal"));
    }

    #[test]
    fn decorator_on_class_is_recorded() {
        let (sink, _) = parse_and_translate("@Component({selector: 'app'})\nclass Widget {}\n");
        let class = sink.nodes().into_iter().find(|n| n.name == "Widget").unwrap();
        let list = class.metadata.get("annotations").and_then(Attribute::as_str_list).unwrap();
        assert!(list[0].contains("Component"));
    }

    #[test]
    fn constructor_method_is_flagged() {
        let (sink, _) = parse_and_translate("class A { constructor() {} }\n");
        let ctor = sink.nodes().into_iter().find(|n| n.name == "constructor").unwrap();
        assert_eq!(ctor.metadata.get("is_constructor").and_then(Attribute::as_bool), Some(true));
    }

    #[test]
    fn named_import_records_source_path() {
        let (sink, _) = parse_and_translate("import { helper } from \"pkg/util\";\n");
        let import = sink.nodes().into_iter().find(|n| n.name == "helper").unwrap();
        assert_eq!(import.metadata.get("importPath").and_then(Attribute::as_str), Some("pkg/util"));
    }

    #[test]
    fn new_expression_flagged_as_constructor_call() {
        let (sink, _) = parse_and_translate("const d = new Dog();\n");
        let call = sink
            .nodes()
            .into_iter()
            .find(|n| n.metadata.get("is_constructor").and_then(Attribute::as_bool) == Some(true));
        assert!(call.is_some());
    }
}
