//! Lowering of tree-sitter-cpp syntax trees into cursor trees.
//!
//! Only declarations become cursors. Records, namespaces and linkage blocks
//! recurse; conditional preprocessor blocks are flattened into their parent,
//! except that `#ifdef __HEART_CODEGEN_ACTIVE` / `#ifndef` keep only the
//! branch a codegen build would see.

use crate::preprocess::CODEGEN_ACTIVE_DEFINE;
use heartgen_core::{AccessSpecifier, CursorId, CursorKind, CursorTree, NewCursor, TypeSignature};
use std::path::Path;
use tree_sitter::{Node, Tree};

/// Build the cursor tree for `file` from its parsed `source`
pub fn lower(syntax: &Tree, source: &str, file: &Path) -> CursorTree {
    let mut lowering = Lowering {
        source: source.as_bytes(),
        tree: CursorTree::new(file),
    };
    let root = lowering.tree.root();
    let mut context = DeclContext::top_level();
    lowering.lower_items(syntax.root_node(), root, &mut context);
    lowering.tree
}

/// Where declarations currently land
#[derive(Debug, Clone)]
struct DeclContext {
    /// Enclosing namespaces and records, `::`-joined
    qualifier: String,
    /// Simple name of the enclosing record, if any
    record: Option<String>,
    /// Access applied to the next member
    access: AccessSpecifier,
}

impl DeclContext {
    fn top_level() -> Self {
        Self {
            qualifier: String::new(),
            record: None,
            access: AccessSpecifier::Invalid,
        }
    }

    fn namespace(qualifier: String) -> Self {
        Self {
            qualifier,
            ..Self::top_level()
        }
    }

    fn record(qualifier: String, name: &str, access: AccessSpecifier) -> Self {
        Self {
            qualifier,
            record: Some(name.to_string()),
            access,
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.qualifier.is_empty() || name.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.qualifier, name)
        }
    }

    fn member_access(&self) -> AccessSpecifier {
        if self.record.is_some() {
            self.access
        } else {
            AccessSpecifier::Invalid
        }
    }
}

struct Lowering<'s> {
    source: &'s [u8],
    tree: CursorTree,
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut walker = node.walk();
    let children = node.named_children(&mut walker).collect();
    children
}

fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("declarator").or_else(|| node.named_child(0))
}

/// Identifier node a declarator ultimately names
fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "destructor_name"
        | "operator_name" | "template_function" | "template_method" => Some(node),
        "qualified_identifier" => node
            .child_by_field_name("name")
            .and_then(declarator_name)
            .or(Some(node)),
        "pointer_declarator" | "reference_declarator" | "array_declarator"
        | "function_declarator" | "parenthesized_declarator" | "attributed_declarator"
        | "init_declarator" => inner_declarator(node).and_then(declarator_name),
        _ => None,
    }
}

/// Whether a declarator declares a function rather than a (function pointer) object
fn declares_function(node: Node<'_>) -> bool {
    match node.kind() {
        "function_declarator" => node
            .child_by_field_name("declarator")
            .map_or(true, |inner| inner.kind() != "parenthesized_declarator"),
        "pointer_declarator" | "reference_declarator" | "attributed_declarator"
        | "parenthesized_declarator" => inner_declarator(node).map_or(false, declares_function),
        _ => false,
    }
}

fn is_record_specifier(kind: &str) -> bool {
    matches!(kind, "struct_specifier" | "class_specifier" | "union_specifier")
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Whitespace-normalised source text
    fn spelling(&self, node: Node<'_>) -> String {
        self.text(node).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn push(&mut self, parent: CursorId, cursor: NewCursor, at: Node<'_>) -> CursorId {
        let position = at.start_position();
        self.tree.push(
            parent,
            cursor.at(position.row as u32 + 1, position.column as u32 + 1),
        )
    }

    fn lower_items(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        for child in named_children(node) {
            self.lower_item(child, parent, context);
        }
    }

    fn lower_item(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        match node.kind() {
            "namespace_definition" => self.lower_namespace(node, parent, context),
            "struct_specifier" | "class_specifier" | "union_specifier" => {
                self.lower_record(node, parent, context, false);
            }
            "enum_specifier" => {
                let name = node.child_by_field_name("name");
                let spelling = name.map(|n| self.text(n)).unwrap_or("");
                let cursor = NewCursor::new(CursorKind::EnumDecl, spelling)
                    .with_access(context.member_access())
                    .with_type(TypeSignature::new(spelling, context.qualify(spelling)));
                self.push(parent, cursor, name.unwrap_or(node));
            }
            "field_declaration" | "declaration" => self.lower_declaration(node, parent, context),
            "function_definition" => self.lower_function(node, parent, context),
            "template_declaration" => self.lower_template(node, parent, context),
            "linkage_specification" => self.lower_linkage(node, parent, context),
            "access_specifier" => self.lower_access(node, parent, context),
            "preproc_ifdef" => self.lower_ifdef(node, parent, context),
            "preproc_if" | "preproc_else" | "preproc_elif" | "declaration_list" | "ERROR" => {
                self.lower_items(node, parent, context)
            }
            "alias_declaration" | "type_definition" | "using_declaration"
            | "static_assert_declaration" | "friend_declaration" | "namespace_alias_definition"
            | "template_instantiation" => {
                let cursor = NewCursor::new(CursorKind::Other, "").with_access(context.member_access());
                self.push(parent, cursor, node);
            }
            _ => {}
        }
    }

    fn lower_namespace(&mut self, node: Node<'_>, parent: CursorId, context: &DeclContext) {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n)).unwrap_or("");
        let qualified = if name.is_empty() {
            context.qualifier.clone()
        } else {
            context.qualify(name)
        };

        let cursor = NewCursor::new(CursorKind::Namespace, name)
            .with_type(TypeSignature::plain(qualified.clone()));
        let id = self.push(parent, cursor, name_node.unwrap_or(node));

        if let Some(body) = node.child_by_field_name("body") {
            self.lower_items(body, id, &mut DeclContext::namespace(qualified));
        }
    }

    fn lower_record(&mut self, node: Node<'_>, parent: CursorId, context: &DeclContext, template: bool) -> CursorId {
        let (kind, default_access) = match node.kind() {
            "class_specifier" => (CursorKind::ClassDecl, AccessSpecifier::Private),
            "union_specifier" => (CursorKind::UnionDecl, AccessSpecifier::Public),
            _ => (CursorKind::StructDecl, AccessSpecifier::Public),
        };
        let kind = if template { CursorKind::ClassTemplate } else { kind };

        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.spelling(n)).unwrap_or_default();
        let qualified = context.qualify(&name);

        let cursor = NewCursor::new(kind, name.clone())
            .with_access(context.member_access())
            .with_type(TypeSignature::new(name.clone(), qualified.clone()));
        let id = self.push(parent, cursor, name_node.unwrap_or(node));

        if let Some(body) = node.child_by_field_name("body") {
            let mut inner = DeclContext::record(qualified, &name, default_access);
            self.lower_items(body, id, &mut inner);
        }
        id
    }

    /// `field_declaration` inside records, `declaration` anywhere
    fn lower_declaration(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        let type_node = node.child_by_field_name("type");

        // `struct Foo { ... };` and `struct { ... } value;` define a type in place
        if let Some(ty) = type_node {
            let defines_type = (is_record_specifier(ty.kind()) || ty.kind() == "enum_specifier")
                && ty.child_by_field_name("body").is_some();
            if defines_type {
                self.lower_item(ty, parent, context);
            }
        }

        let is_static = named_children(node)
            .into_iter()
            .any(|c| c.kind() == "storage_class_specifier" && self.text(c) == "static");
        let is_field = node.kind() == "field_declaration" && context.record.is_some() && !is_static;
        let base = self.type_spelling(node, type_node);

        let mut walker = node.walk();
        let declarators: Vec<Node<'_>> = node.children_by_field_name("declarator", &mut walker).collect();

        for declarator in declarators {
            let Some(name_node) = declarator_name(declarator) else {
                continue;
            };

            let kind = if declares_function(declarator) {
                self.function_kind(name_node, type_node.is_none(), context)
            } else if is_field {
                CursorKind::FieldDecl
            } else {
                CursorKind::VarDecl
            };

            let cursor = NewCursor::new(kind, self.text(name_node))
                .with_access(context.member_access())
                .with_type(TypeSignature::plain(self.decorated_type(&base, declarator)));
            self.push(parent, cursor, name_node);
        }
    }

    fn lower_function(&mut self, node: Node<'_>, parent: CursorId, context: &DeclContext) {
        let type_node = node.child_by_field_name("type");
        let Some(name_node) = node.child_by_field_name("declarator").and_then(declarator_name) else {
            return;
        };

        let kind = self.function_kind(name_node, type_node.is_none(), context);
        let cursor = NewCursor::new(kind, self.text(name_node))
            .with_access(context.member_access())
            .with_type(TypeSignature::plain(self.type_spelling(node, type_node)));
        self.push(parent, cursor, name_node);
    }

    fn function_kind(&self, name: Node<'_>, untyped: bool, context: &DeclContext) -> CursorKind {
        let Some(record) = context.record.as_deref() else {
            return CursorKind::FunctionDecl;
        };
        if name.kind() == "destructor_name" {
            CursorKind::Destructor
        } else if self.text(name) == record || (untyped && name.kind() != "operator_name") {
            CursorKind::Constructor
        } else {
            CursorKind::Method
        }
    }

    fn lower_template(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        for child in named_children(node) {
            match child.kind() {
                "template_parameter_list" => {}
                kind if is_record_specifier(kind) => {
                    self.lower_record(child, parent, context, true);
                }
                "declaration" | "field_declaration" | "function_definition" => {
                    let name_node = child.child_by_field_name("declarator").and_then(declarator_name);
                    let name = name_node.map(|n| self.text(n)).unwrap_or("");
                    let cursor = NewCursor::new(CursorKind::Other, name).with_access(context.member_access());
                    self.push(parent, cursor, name_node.unwrap_or(child));
                }
                _ => self.lower_item(child, parent, context),
            }
        }
    }

    fn lower_linkage(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        let id = self.push(parent, NewCursor::new(CursorKind::LinkageSpec, ""), node);
        if let Some(body) = node.child_by_field_name("body") {
            if body.kind() == "declaration_list" {
                self.lower_items(body, id, context);
            } else {
                self.lower_item(body, id, context);
            }
        }
    }

    fn lower_access(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        let access = match self.text(node).trim().trim_end_matches(':').trim() {
            "public" => AccessSpecifier::Public,
            "protected" => AccessSpecifier::Protected,
            "private" => AccessSpecifier::Private,
            _ => return,
        };
        context.access = access;
        self.push(
            parent,
            NewCursor::new(CursorKind::AccessSpecifier, "").with_access(access),
            node,
        );
    }

    fn lower_ifdef(&mut self, node: Node<'_>, parent: CursorId, context: &mut DeclContext) {
        let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or("");
        if name != CODEGEN_ACTIVE_DEFINE {
            self.lower_items(node, parent, context);
            return;
        }

        // `#ifdef` keeps the body, `#ifndef` keeps the alternative
        let negated = node.child(0).map_or(false, |c| c.kind() == "#ifndef");
        for child in named_children(node) {
            let is_alternative = matches!(child.kind(), "preproc_else" | "preproc_elif");
            if is_alternative == negated {
                self.lower_item(child, parent, context);
            }
        }
    }

    /// Type as written, prefixed with its cv-qualifiers
    fn type_spelling(&self, node: Node<'_>, type_node: Option<Node<'_>>) -> String {
        let mut parts: Vec<String> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "type_qualifier")
            .map(|c| self.spelling(c))
            .collect();
        if let Some(ty) = type_node {
            parts.push(self.spelling(ty));
        }
        parts.join(" ")
    }

    /// Apply pointer, reference and array decorations of `declarator` to `base`
    fn decorated_type(&self, base: &str, declarator: Node<'_>) -> String {
        let mut spelling = base.to_string();
        let mut current = Some(declarator);

        while let Some(node) = current {
            match node.kind() {
                "pointer_declarator" => spelling.push_str(" *"),
                "reference_declarator" => {
                    if self.text(node).trim_start().starts_with("&&") {
                        spelling.push_str(" &&");
                    } else {
                        spelling.push_str(" &");
                    }
                }
                "array_declarator" => {
                    let size = node.child_by_field_name("size").map(|s| self.text(s)).unwrap_or("");
                    spelling.push_str(&format!(" [{}]", size));
                }
                "parenthesized_declarator" | "attributed_declarator" | "init_declarator" => {}
                _ => break,
            }
            current = inner_declarator(node);
        }

        spelling
    }
}
