//! C# `LanguageVisitor`.
//!
//! The teacher carries no C# plugin at all — this one is original to this
//! crate, best-effort per the Open Question this repo's grounding ledger
//! resolves in DESIGN.md: classes, methods, imports, calls and literals are
//! modeled; everything else falls through to `traverse_children` rather than
//! trying to special-case the rest of a grammar none of the corpus covers.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::{NameChainResolver, ParamSpec, Translate};
use crate::features::parsing::domain::ScopeId;
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Annotation, Attribute, Metadata};

use super::common::{push_annotation, settle, span, text, traverse_children};

pub struct CSharpVisitor;

impl CSharpVisitor {
    pub fn new() -> Self {
        Self
    }

    fn extract_attributes(&self, metadata: &mut Metadata, source: &str, node: TsNode) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "attribute_list" {
                continue;
            }
            let mut icursor = child.walk();
            for attr in child.named_children(&mut icursor) {
                if attr.kind() != "attribute" {
                    continue;
                }
                let Some(name_node) = attr.child_by_field_name("name") else { continue };
                let mut annotation = Annotation::new(text(name_node, source));
                if let Some(args) = attr.child_by_field_name("arg_list") {
                    let mut acursor = args.walk();
                    for (i, arg) in args.named_children(&mut acursor).enumerate() {
                        annotation = annotation.with_argument(format!("arg{i}"), text(arg, source));
                    }
                }
                push_annotation(metadata, annotation);
            }
        }
    }

    fn handle_class_like(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId, kind_flag: &'static str) -> u64 {
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let name = text(name_node, source);
        let mut metadata = Metadata::new();
        metadata.insert(kind_flag.to_string(), Attribute::Bool(true));
        self.extract_attributes(&mut metadata, source, node);

        if let Some(bases) = node.child_by_field_name("bases") {
            let mut names = Vec::new();
            let mut cursor = bases.walk();
            for t in bases.named_children(&mut cursor) {
                names.push(text(t, source).to_string());
            }
            if let Some(first) = names.first() {
                metadata.insert("extends".into(), Attribute::Str(first.clone()));
            }
            if names.len() > 1 {
                metadata.insert("implements".into(), Attribute::StrList(names[1..].to_vec()));
            }
        }

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
                "method_declaration" | "constructor_declaration" => {
                    self.handle_method(translate, source, member, class_scope);
                }
                "field_declaration" => self.handle_field_declaration(translate, source, member, class_id, class_scope),
                "property_declaration" => {
                    if let Some(name_node) = member.child_by_field_name("name") {
                        let mut metadata = Metadata::new();
                        self.extract_attributes(&mut metadata, source, member);
                        let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(member), metadata);
                    }
                }
                _ => traverse_children(self, translate, source, member, class_scope),
            }
        }
    }

    fn handle_field_declaration(&self, translate: &mut Translate, source: &str, node: TsNode, class_id: u64, class_scope: ScopeId) {
        let mut metadata = Metadata::new();
        self.extract_attributes(&mut metadata, source, node);
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declaration" {
                continue;
            }
            let mut icursor = declarator.walk();
            for vdecl in declarator.named_children(&mut icursor) {
                if vdecl.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name_node) = vdecl.child_by_field_name("name") else { continue };
                let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(vdecl), metadata.clone());
            }
        }
    }

    fn collect_parameters(&self, source: &str, node: TsNode) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let Some(param_list) = node.child_by_field_name("parameters") else { return params };
        let mut cursor = param_list.walk();
        for child in param_list.named_children(&mut cursor) {
            if child.kind() != "parameter" {
                continue;
            }
            let Some(name_node) = child.child_by_field_name("name") else { continue };
            let mut spec = ParamSpec::new(text(name_node, source), span(child));
            if child.child_by_field_name("type").is_some() {
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
        self.extract_attributes(&mut metadata, source, node);
        if node.kind() == "constructor_declaration" {
            metadata.insert("is_constructor".into(), Attribute::Bool(true));
        }
        let params = self.collect_parameters(source, node);
        settle(translate.create_function(scope, name, span(node), &params, metadata, |translate, _fn_id, fn_scope| {
            if let Some(body) = node.child_by_field_name("body") {
                traverse_children(self, translate, source, body, fn_scope);
            }
        }))
    }

    fn handle_using(&self, translate: &mut Translate, source: &str, node: TsNode) -> u64 {
        let Some(name_node) = node.named_child(0) else { return NO_NODE };
        let path = text(name_node, source).to_string();
        let name = path.rsplit('.').next().unwrap_or(&path).to_string();
        let mut metadata = Metadata::new();
        metadata.insert("importPath".into(), Attribute::Str(path));
        settle(translate.handle_import(translate.root_scope(), &name, span(node), metadata))
    }

    fn resolve_member_access(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut parts = Vec::new();
        let mut cursor = node;
        loop {
            match cursor.kind() {
                "member_access_expression" => {
                    if let Some(name) = cursor.child_by_field_name("name") {
                        parts.push(text(name, source).to_string());
                    }
                    match cursor.child_by_field_name("expression") {
                        Some(expr) => cursor = expr,
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
            "member_access_expression" => self.resolve_member_access(translate, source, function, scope),
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

    fn handle_object_creation(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let Some(type_node) = node.child_by_field_name("type") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };
        let callee = settle(translate.handle_identifier(scope, text(type_node, source), span(type_node)));
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

    fn handle_return(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        settle(translate.handle_return(scope, span(node), |translate, rhs_scope| {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                self.traverse_node(translate, source, child, rhs_scope);
            }
        }))
    }
}

impl Default for CSharpVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageVisitor for CSharpVisitor {
    fn language_tag(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn tree_sitter_language(&self) -> TsLanguage {
        tree_sitter_c_sharp::language()
    }

    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if translate.is_cancelled() {
            return NO_NODE;
        }
        match node.kind() {
            "class_declaration" => self.handle_class_like(translate, source, node, scope, "is_class"),
            "interface_declaration" => self.handle_class_like(translate, source, node, scope, "is_interface"),
            "struct_declaration" => self.handle_class_like(translate, source, node, scope, "is_struct"),
            "record_declaration" => self.handle_class_like(translate, source, node, scope, "is_record"),
            "using_directive" => self.handle_using(translate, source, node),
            "invocation_expression" => self.handle_call(translate, source, node, scope),
            "object_creation_expression" => self.handle_object_creation(translate, source, node, scope),
            "return_statement" => self.handle_return(translate, source, node, scope),
            "member_access_expression" => self.resolve_member_access(translate, source, node, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(node, source), span(node))),
            "string_literal" | "integer_literal" | "real_literal" | "true" | "false" | "null_literal" => {
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
        parser.set_language(&tree_sitter_c_sharp::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let sink = Arc::new(InMemoryGraphSink::new());
        let mut translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        let visitor = CSharpVisitor::new();
        let root_scope = translate.root_scope();
        visitor.traverse_node(&mut translate, source, tree.root_node(), root_scope);
        let module = translate.new_module_scope("mod", span(tree.root_node()), Metadata::new()).unwrap();
        translate.finish(module).unwrap();
        (sink, module)
    }

    #[test]
    fn class_with_base_records_extends() {
        let (sink, _) = parse_and_translate("class Dog : Animal {}\n");
        let class = sink.nodes().into_iter().find(|n| n.name == "Dog").unwrap();
        assert_eq!(class.metadata.get("extends").and_then(Attribute::as_str), Some("Animal"));
    }

    #[test]
    fn using_directive_records_import_path() {
        let (sink, _) = parse_and_translate("using System.Collections.Generic;\n");
        let import = sink.nodes().into_iter().find(|n| n.name == "Generic").unwrap();
        assert_eq!(import.metadata.get("importPath").and_then(Attribute::as_str), Some("System.Collections.Generic"));
    }

    #[test]
    fn constructor_is_flagged() {
        let (sink, _) = parse_and_translate("class A { public A() {} }\n");
        let ctor = sink.nodes().into_iter().find(|n| n.name == "A" && n.metadata.get("is_constructor").is_some());
        assert!(ctor.is_some());
    }
}
