//! Java `LanguageVisitor`.
//!
//! Grounded on the teacher's `plugins/java.rs`: `class_declaration` /
//! `interface_declaration` / `enum_declaration` / `record_declaration` all
//! sharing `name` + `body`, `class_declaration`'s extra `superclass` +
//! `interfaces` fields, annotation extraction off the `modifiers` field
//! child, and the Javadoc-from-preceding-`block_comment` heuristic.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use crate::features::parsing::application::{NameChainResolver, ParamSpec, Translate};
use crate::features::parsing::domain::ScopeId;
use crate::features::parsing::ports::{LanguageVisitor, NO_NODE};
use crate::shared::models::{Annotation, Attribute, Metadata};

use super::common::{normalize_method_name, push_annotation, settle, span, text, traverse_children};

/// Text of an annotation argument value, with a `string_literal`'s
/// surrounding quotes stripped (`"/u"` -> `/u`); every other literal kind
/// (numbers, identifiers, field accesses, `.class` expressions) is recorded
/// verbatim.
fn annotation_value_text<'a>(node: TsNode, source: &'a str) -> &'a str {
    let raw = text(node, source);
    if node.kind() == "string_literal" {
        raw.trim_matches('"')
    } else {
        raw
    }
}

pub struct JavaVisitor;

impl JavaVisitor {
    pub fn new() -> Self {
        Self
    }

    fn extract_modifiers(&self, metadata: &mut Metadata, source: &str, node: TsNode) {
        let Some(modifiers) = node.child_by_field_name("modifiers") else { return };
        let mut cursor = modifiers.walk();
        for child in modifiers.named_children(&mut cursor) {
            match child.kind() {
                "annotation" => {
                    let name = child.child_by_field_name("name").map(|n| text(n, source)).unwrap_or("");
                    let mut annotation = Annotation::new(name);
                    if let Some(args) = child.child_by_field_name("arguments") {
                        let mut acursor = args.walk();
                        for arg in args.named_children(&mut acursor) {
                            // `element_value_pair` is `key = value`; anything
                            // else is the shorthand single-value form, which
                            // Java binds to the implicit `value` element.
                            if arg.kind() == "element_value_pair" {
                                let key = arg.child_by_field_name("key").map(|n| text(n, source)).unwrap_or("value");
                                if let Some(value) = arg.child_by_field_name("value") {
                                    annotation = annotation.with_argument(key, annotation_value_text(value, source));
                                }
                            } else {
                                annotation = annotation.with_argument("value", annotation_value_text(arg, source));
                            }
                        }
                    }
                    push_annotation(metadata, annotation);
                }
                "marker_annotation" => {
                    let name = child.child_by_field_name("name").map(|n| text(n, source)).unwrap_or("");
                    push_annotation(metadata, Annotation::new(name));
                }
                _ => {}
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
        self.extract_modifiers(&mut metadata, source, node);

        if let Some(superclass) = node.child_by_field_name("superclass") {
            if let Some(type_node) = superclass.named_child(0) {
                metadata.insert("extends".into(), Attribute::Str(text(type_node, source).to_string()));
            }
        }
        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            let mut names = Vec::new();
            let mut cursor = interfaces.walk();
            for iface in interfaces.named_children(&mut cursor) {
                // `interfaces` wraps a `type_list`; its named children are
                // the actual interface type nodes.
                if iface.kind() == "type_list" {
                    let mut icursor = iface.walk();
                    for t in iface.named_children(&mut icursor) {
                        names.push(text(t, source).to_string());
                    }
                } else {
                    names.push(text(iface, source).to_string());
                }
            }
            if !names.is_empty() {
                metadata.insert("implements".into(), Attribute::StrList(names));
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
                "field_declaration" => self.handle_field_declaration(translate, source, member, class_id, class_scope),
                "method_declaration" | "constructor_declaration" => {
                    self.handle_method(translate, source, member, class_scope);
                }
                "enum_constant" => {
                    let mut metadata = Metadata::new();
                    metadata.insert("is_enum_constant".into(), Attribute::Bool(true));
                    if let Some(name_node) = member.child_by_field_name("name") {
                        let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(member), metadata);
                    }
                }
                _ => traverse_children(self, translate, source, member, class_scope),
            }
        }
    }

    fn handle_field_declaration(&self, translate: &mut Translate, source: &str, node: TsNode, class_id: u64, class_scope: ScopeId) {
        let mut metadata = Metadata::new();
        self.extract_modifiers(&mut metadata, source, node);
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else { continue };
            let _ = translate.add_field(class_id, class_scope, text(name_node, source), span(declarator), metadata.clone());
            if let Some(value) = declarator.child_by_field_name("value") {
                self.traverse_node(translate, source, value, class_scope);
            }
        }
    }

    fn collect_parameters(&self, source: &str, node: TsNode) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let Some(param_list) = node.child_by_field_name("parameters") else { return params };
        let mut cursor = param_list.walk();
        for child in param_list.named_children(&mut cursor) {
            if !matches!(child.kind(), "formal_parameter" | "spread_parameter") {
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
        let raw_name = text(name_node, source);
        let name = normalize_method_name(raw_name);

        let mut metadata = Metadata::new();
        self.extract_modifiers(&mut metadata, source, node);
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

    fn handle_import(&self, translate: &mut Translate, source: &str, node: TsNode) -> u64 {
        let mut cursor = node.walk();
        let mut path = String::new();
        for child in node.named_children(&mut cursor) {
            if matches!(child.kind(), "scoped_identifier" | "identifier") {
                path = text(child, source).to_string();
            }
        }
        if path.is_empty() {
            return NO_NODE;
        }
        let name = path.rsplit('.').next().unwrap_or(&path).to_string();
        let mut metadata = Metadata::new();
        metadata.insert("importPath".into(), Attribute::Str(path));
        settle(translate.handle_import(translate.root_scope(), &name, span(node), metadata))
    }

    /// Peel a dotted field-access chain right-to-left, mirroring the
    /// identical Python helper (spec.md §4.3 "Key algorithm" is
    /// language-independent).
    fn resolve_field_access(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut parts = Vec::new();
        let mut cursor = node;
        loop {
            match cursor.kind() {
                "field_access" => {
                    if let Some(field) = cursor.child_by_field_name("field") {
                        parts.push(text(field, source).to_string());
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
            "field_access" => {
                let lhs_id = self.resolve_field_access(translate, source, left, scope);
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

    fn handle_local_variable(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        let mut last = NO_NODE;
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else { continue };
            let name = text(name_node, source).to_string();
            last = if let Some(value) = declarator.child_by_field_name("value") {
                settle(translate.handle_assignment(scope, &name, span(declarator), |translate, rhs_scope| {
                    self.traverse_node(translate, source, value, rhs_scope);
                }))
            } else {
                settle(translate.handle_identifier(scope, &name, span(declarator)))
            };
        }
        last
    }

    fn handle_call(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        // tree-sitter-java's `method_invocation` has no `function` field:
        // the method name is `name`, the receiver (if any) is `object`.
        let Some(name_node) = node.child_by_field_name("name") else {
            traverse_children(self, translate, source, node, scope);
            return NO_NODE;
        };

        // If the receiver is itself a call (`a.b().c()`), traverse it first
        // so its Call node is emitted before this one (spec.md §8 S2); the
        // outer call still resolves its callee from `name` alone, never the
        // receiver chain.
        if let Some(object) = node.child_by_field_name("object") {
            self.traverse_node(translate, source, object, scope);
        }

        let callee = settle(translate.handle_identifier(scope, text(name_node, source), span(name_node)));

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

    fn handle_for_each(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if let Some(iterable) = node.child_by_field_name("value") {
            settle(translate.handle_rhs_with_fake_variable(scope, crate::features::parsing::domain::synthetic_name::ITER, span(iterable), |translate, s| {
                self.traverse_node(translate, source, iterable, s);
            }));
        }
        settle(translate.handle_loop(scope, span(node), |translate, body_scope| {
            if let Some(name_node) = node.child_by_field_name("name") {
                settle(translate.handle_identifier(body_scope, text(name_node, source), span(name_node)));
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
            settle(translate.handle_rhs_with_fake_variable(scope, crate::features::parsing::domain::synthetic_name::COND, span(cond), |translate, s| {
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

impl Default for JavaVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageVisitor for JavaVisitor {
    fn language_tag(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn tree_sitter_language(&self) -> TsLanguage {
        tree_sitter_java::language()
    }

    fn traverse_node(&self, translate: &mut Translate, source: &str, node: TsNode, scope: ScopeId) -> u64 {
        if translate.is_cancelled() {
            return NO_NODE;
        }
        match node.kind() {
            "class_declaration" => self.handle_class_like(translate, source, node, scope, "is_class"),
            "interface_declaration" => self.handle_class_like(translate, source, node, scope, "is_interface"),
            "enum_declaration" => self.handle_class_like(translate, source, node, scope, "is_enum"),
            "record_declaration" => self.handle_class_like(translate, source, node, scope, "is_record"),
            "annotation_type_declaration" => self.handle_class_like(translate, source, node, scope, "is_annotation_type"),
            "import_declaration" => self.handle_import(translate, source, node),
            "assignment_expression" => self.handle_assignment(translate, source, node, scope),
            "local_variable_declaration" => self.handle_local_variable(translate, source, node, scope),
            "method_invocation" => self.handle_call(translate, source, node, scope),
            "object_creation_expression" => self.handle_object_creation(translate, source, node, scope),
            "if_statement" => self.handle_if(translate, source, node, scope),
            "enhanced_for_statement" => self.handle_for_each(translate, source, node, scope),
            "for_statement" => self.handle_for(translate, source, node, scope),
            "while_statement" | "do_statement" => self.handle_while(translate, source, node, scope),
            "try_statement" | "try_with_resources_statement" => self.handle_try(translate, source, node, scope),
            "throw_statement" => self.handle_throw(translate, source, node, scope),
            "return_statement" => self.handle_return(translate, source, node, scope),
            "field_access" => self.resolve_field_access(translate, source, node, scope),
            "identifier" => settle(translate.handle_identifier(scope, text(node, source), span(node))),
            "string_literal" | "decimal_integer_literal" | "decimal_floating_point_literal" | "true" | "false" | "null_literal" | "character_literal" => {
                settle(translate.handle_literal(scope, text(node, source), span(node)))
            }
            "line_comment" | "block_comment" => NO_NODE,
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
        parser.set_language(&tree_sitter_java::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let sink = Arc::new(InMemoryGraphSink::new());
        let mut translate = Translate::new(1, 1, sink.clone(), CancellationToken::new());
        let visitor = JavaVisitor::new();
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
        let implements = class.metadata.get("implements").and_then(Attribute::as_str_list).unwrap();
        assert_eq!(implements, vec!["Comparable".to_string(), "Serializable".to_string()]);
    }

    #[test]
    fn annotation_on_method_is_recorded() {
        let (sink, _) = parse_and_translate("class A { @Override\n    public void run() {} }\n");
        let method = sink.nodes().into_iter().find(|n| n.name == "run").unwrap();
        let list = method.metadata.get("annotations").and_then(Attribute::as_str_list).unwrap();
        assert!(list[0].contains("Override"));
    }

    #[test]
    fn constructor_is_flagged() {
        let (sink, _) = parse_and_translate("class A { A() {} }\n");
        let ctor = sink.nodes().into_iter().find(|n| n.name == "A" && n.metadata.get("is_constructor").is_some());
        assert!(ctor.is_some());
    }

    #[test]
    fn method_name_normalizes_trailing_generic_signature() {
        let (sink, _) = parse_and_translate("class A { Optional<User> findById(Long id) { return null; } }\n");
        assert!(sink.nodes().into_iter().any(|n| n.name == "findById"));
    }

    #[test]
    fn object_creation_flagged_as_constructor_call() {
        let (sink, _) = parse_and_translate("class A { void f() { Dog d = new Dog(); } }\n");
        let call = sink
            .nodes()
            .into_iter()
            .find(|n| n.metadata.get("is_constructor").and_then(Attribute::as_bool) == Some(true));
        assert!(call.is_some());
    }

    #[test]
    fn shorthand_annotation_argument_keyed_value_and_unquoted() {
        let (sink, _) = parse_and_translate("class Api {\n    @GetMapping(\"/u\")\n    public void list() {} }\n");
        let method = sink.nodes().into_iter().find(|n| n.name == "list").unwrap();
        let list = method.metadata.get("annotations").and_then(Attribute::as_str_list).unwrap();
        assert_eq!(list[0], r#"{"name":"GetMapping","arguments":{"value":"/u"}}"#);
    }

    #[test]
    fn named_annotation_arguments_keep_their_key() {
        let (sink, _) = parse_and_translate("class Api {\n    @RequestMapping(path = \"/u\", method = GET)\n    public void list() {} }\n");
        let method = sink.nodes().into_iter().find(|n| n.name == "list").unwrap();
        let list = method.metadata.get("annotations").and_then(Attribute::as_str_list).unwrap();
        assert!(list[0].contains(r#""path":"/u""#));
        assert!(list[0].contains(r#""method":"GET""#));
    }

    #[test]
    fn chained_call_emits_inner_call_node_before_outer() {
        let (sink, _) = parse_and_translate("class A { void run() { a.b().c(); } }\n");
        let call_count = sink.nodes().into_iter().filter(|n| n.name == "__call__").count();
        assert_eq!(call_count, 2, "expected a Call node for both b() and c()");
        let calls_edges = sink
            .relations()
            .into_iter()
            .filter(|r| r.label == crate::features::parsing::domain::RelationKind::Calls)
            .count();
        assert_eq!(calls_edges, 2);
    }
}
