use crate::config::ExtractorConfig;
use crate::error::{Result, StructureError};
use crate::language::tree_sitter_cpp;
use crate::parser::{ParserKind, SourceParser};
use crate::types::{
    bounded_snippet, ClassEntity, FileInfo, FunctionEntity, MethodEntity, Parameter, Visibility,
};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Grammar-aware parser backed by tree-sitter-cpp
pub struct GrammarParser {
    language: tree_sitter::Language,
    class_snippet_chars: usize,
    function_snippet_chars: usize,
}

impl GrammarParser {
    /// Probe the grammar; fails when the linked grammar is ABI-incompatible
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let language = tree_sitter_cpp();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| StructureError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            language,
            class_snippet_chars: config.class_snippet_chars,
            function_snippet_chars: config.function_snippet_chars,
        })
    }

    fn new_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| StructureError::tree_sitter(format!("Failed to set language: {e}")))?;
        Ok(parser)
    }
}

impl SourceParser for GrammarParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Grammar
    }

    fn parse(&self, path: &Path, content: &str) -> Result<FileInfo> {
        // tree_sitter::Parser is not Sync, so each call gets its own
        let mut parser = self.new_parser()?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| StructureError::parse("Failed to parse source code"))?;
        let root = tree.root_node();

        let walker = Walker {
            source: content,
            class_snippet_chars: self.class_snippet_chars,
            function_snippet_chars: self.function_snippet_chars,
        };

        let mut info = FileInfo::new(path);
        walker.collect_includes(root, &mut info.includes);
        walker.visit(root, &mut info);

        if root.has_error() && !info.has_entities() {
            return Err(StructureError::parse(format!(
                "syntax errors and no declarations recovered in {}",
                path.display()
            )));
        }

        Ok(info)
    }
}

struct Walker<'s> {
    source: &'s str,
    class_snippet_chars: usize,
    function_snippet_chars: usize,
}

impl<'s> Walker<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn collect_includes(&self, node: Node, includes: &mut Vec<String>) {
        if node.kind() == "preproc_include" {
            if let Some(path) = node.child_by_field_name("path") {
                let raw = self.text(path).trim();
                let name = raw.trim_matches(|c| c == '"' || c == '<' || c == '>');
                if !name.is_empty() {
                    includes.push(name.to_string());
                }
            }
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_includes(child, includes);
        }
    }

    /// Walk declarations outside function bodies
    fn visit(&self, node: Node, info: &mut FileInfo) {
        match node.kind() {
            "class_specifier" | "struct_specifier" => {
                if let Some(class) = self.parse_class(node) {
                    info.classes.push(class);
                }
                // Nested types are reported as classes of their own
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_nested_types(body, info);
                }
                return;
            }
            "function_definition" => {
                if let Some(function) = self.parse_free_function(node) {
                    info.functions.push(function);
                }
                return;
            }
            "compound_statement" => return,
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, info);
        }
    }

    fn visit_nested_types(&self, node: Node, info: &mut FileInfo) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_specifier" | "struct_specifier" => self.visit(child, info),
                "function_definition" | "compound_statement" => {}
                _ => self.visit_nested_types(child, info),
            }
        }
    }

    fn parse_class(&self, node: Node) -> Option<ClassEntity> {
        let body = node.child_by_field_name("body")?;
        let name = node.child_by_field_name("name")?;
        let name = self.text(name).trim().to_string();
        if name.is_empty() {
            return None;
        }

        let mut base_classes = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "base_class_clause" {
                let mut base_cursor = child.walk();
                for base in child.children(&mut base_cursor) {
                    if matches!(
                        base.kind(),
                        "type_identifier" | "qualified_identifier" | "template_type"
                    ) {
                        base_classes.push(self.text(base).trim().to_string());
                    }
                }
            }
        }

        let mut visibility = if node.kind() == "struct_specifier" {
            Visibility::Public
        } else {
            Visibility::Private
        };
        let mut methods = Vec::new();
        let mut body_cursor = body.walk();
        for member in body.children(&mut body_cursor) {
            if member.kind() == "access_specifier" {
                if let Some(v) = Visibility::from_label(self.text(member)) {
                    visibility = v;
                }
                continue;
            }
            self.collect_member(member, visibility, &mut methods);
        }

        let snippet = bounded_snippet(self.text(node), self.class_snippet_chars);

        Some(ClassEntity {
            name,
            methods,
            base_classes,
            snippet,
        })
    }

    fn collect_member(&self, member: Node, visibility: Visibility, methods: &mut Vec<MethodEntity>) {
        match member.kind() {
            "field_declaration" | "declaration" | "function_definition" => {
                if let Some(method) = self.parse_method(member, visibility) {
                    methods.push(method);
                }
            }
            "template_declaration" => {
                let mut cursor = member.walk();
                for child in member.children(&mut cursor) {
                    self.collect_member(child, visibility, methods);
                }
            }
            _ => {}
        }
    }

    fn parse_method(&self, node: Node, visibility: Visibility) -> Option<MethodEntity> {
        let (declarator, indirection) = find_function_declarator(node.child_by_field_name("declarator")?)?;
        let name = self.text(declarator.child_by_field_name("declarator")?).trim().to_string();

        let mut is_static = false;
        let mut is_virtual = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "storage_class_specifier" if self.text(child).trim() == "static" => is_static = true,
                "virtual" | "virtual_function_specifier" => is_virtual = true,
                _ => {}
            }
        }

        let mut is_const = false;
        let mut decl_cursor = declarator.walk();
        for child in declarator.children(&mut decl_cursor) {
            if child.kind() == "type_qualifier" && self.text(child).trim() == "const" {
                is_const = true;
            }
        }

        Some(MethodEntity {
            name,
            return_type: self.return_type(node, &indirection),
            parameters: self.parameters(declarator),
            visibility,
            is_const,
            is_static,
            is_virtual,
        })
    }

    fn parse_free_function(&self, node: Node) -> Option<FunctionEntity> {
        let (declarator, indirection) = find_function_declarator(node.child_by_field_name("declarator")?)?;
        let name_node = declarator.child_by_field_name("declarator")?;
        // `Type::method() {}` is an out-of-line member definition
        if name_node.kind() != "identifier" {
            return None;
        }

        Some(FunctionEntity {
            name: self.text(name_node).to_string(),
            return_type: self.return_type(node, &indirection),
            parameters: self.parameters(declarator),
            snippet: bounded_snippet(self.text(node), self.function_snippet_chars),
        })
    }

    fn return_type(&self, node: Node, indirection: &str) -> String {
        let base = node
            .child_by_field_name("type")
            .map(|ty| self.text(ty).trim().to_string())
            .unwrap_or_default();
        format!("{base}{indirection}")
    }

    fn parameters(&self, function_declarator: Node) -> Vec<Parameter> {
        let Some(list) = function_declarator.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut params = Vec::new();
        let mut cursor = list.walk();
        for param in list.children(&mut cursor) {
            match param.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    params.push(self.parameter(param));
                }
                "variadic_parameter_declaration" | "..." => {
                    params.push(Parameter::new("...", ""));
                }
                _ => {}
            }
        }
        normalize_void(params)
    }

    fn parameter(&self, param: Node) -> Parameter {
        let text = self.text(param);
        let declarator = param.child_by_field_name("declarator");
        let Some(ident) = declarator.and_then(innermost_identifier) else {
            return Parameter::new(text.trim(), "");
        };

        let start = ident.start_byte() - param.start_byte();
        Parameter::new(text[..start].trim(), self.text(ident))
    }
}

/// Unwrap pointer/reference declarators down to the function declarator.
///
/// Returns the declarator plus the `*`/`&` markers that belong to the return type.
fn find_function_declarator(node: Node) -> Option<(Node, String)> {
    let mut current = node;
    let mut indirection = String::new();
    loop {
        match current.kind() {
            "function_declarator" => return Some((current, indirection)),
            "pointer_declarator" => indirection.push('*'),
            "reference_declarator" => {
                let rvalue = current.child(0).is_some_and(|token| token.kind() == "&&");
                indirection.push_str(if rvalue { "&&" } else { "&" });
            }
            _ => return None,
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| last_named_child(current))?;
    }
}

fn last_named_child(node: Node) -> Option<Node> {
    let last = node.named_child_count().checked_sub(1)?;
    node.named_child(last)
}

fn innermost_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    if let Some(inner) = node.child_by_field_name("declarator") {
        return innermost_identifier(inner);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(innermost_identifier)
}

/// `f(void)` declares no parameters
pub(crate) fn normalize_void(params: Vec<Parameter>) -> Vec<Parameter> {
    if params.len() == 1 && params[0].ty == "void" && params[0].name.is_empty() {
        Vec::new()
    } else {
        params
    }
}
