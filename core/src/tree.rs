//! Parent-linked syntax arena lowered from a tree-sitter PHP tree.
//!
//! Every named tree-sitter node becomes one [`SyntaxNode`] in a flat vector.
//! Nodes store the index of their parent, which gives O(depth) ancestor
//! walks without reference cycles. Nodes are allocated in pre-order, so
//! iterating ids in ascending order visits the tree in source order.

use serde::Serialize;

use crate::literal;

/// Index of a node inside a [`SyntaxTree`].
pub type NodeId = u32;

/// The node kinds the analysis cares about. Everything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Root of the file.
    Program,
    /// Free function declaration.
    Function { name: String },
    /// Method declared in a class, trait, interface or enum body.
    Method { name: String },
    /// Anonymous `function () {}` expression.
    Closure,
    /// `fn () => expr`; callable but cannot hold a `return` directly.
    ArrowFunction,
    /// Class, interface, trait, enum or anonymous class.
    ClassLike { name: Option<String> },
    /// `return` statement.
    Return,
    /// `[...]` or `array(...)` literal with its classified entries.
    ArrayLiteral { entries: Vec<ArrayEntry> },
    /// `( expr )`
    Parenthesized,
    Comment,
    Other,
}

/// One non-spread element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayEntry {
    /// `None` for list-style entries without `=>`.
    pub key: Option<ArrayKey>,
}

/// Classification of an explicit array key expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayKey {
    Str(String),
    Int(i64),
    /// Variables, constants, calls, concatenations, interpolated strings...
    Dynamic,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// 1-based line of the node's first character.
    pub line: u32,
}

/// Arena of lowered nodes. The root is always id 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Lower a tree-sitter tree, attaching parent links to every node.
    pub fn lower(root: tree_sitter::Node, source: &[u8]) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut stack: Vec<(tree_sitter::Node, Option<NodeId>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = nodes.len() as NodeId;
            nodes.push(SyntaxNode {
                kind: classify(&node, source),
                parent,
                children: Vec::new(),
                line: node.start_position().row as u32 + 1,
            });
            if let Some(parent) = parent {
                nodes[parent as usize].children.push(id);
            }

            // Reverse push so the leftmost child is popped (and numbered) first.
            let mut cursor = node.walk();
            let named: Vec<_> = node.named_children(&mut cursor).collect();
            for child in named.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self { nodes }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id as usize]
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len() as NodeId
    }

    /// Walk parent links upward from `id`, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).parent,
        }
    }

    /// Expression returned by a `return` node, with parentheses and comments
    /// peeled off. `None` for a bare `return;` or a non-return node.
    pub fn return_value(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        if node.kind != NodeKind::Return {
            return None;
        }
        let mut value = self.first_code_child(id)?;
        while self.node(value).kind == NodeKind::Parenthesized {
            value = self.first_code_child(value)?;
        }
        Some(value)
    }

    fn first_code_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).kind != NodeKind::Comment)
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.node(current).parent;
        Some(current)
    }
}

fn node_text<'a>(node: &tree_sitter::Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn field_text(node: &tree_sitter::Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(&n, source).to_string())
        .filter(|name| !name.is_empty())
}

fn classify(node: &tree_sitter::Node, source: &[u8]) -> NodeKind {
    match node.kind() {
        "program" => NodeKind::Program,
        "function_definition" => NodeKind::Function {
            name: field_text(node, "name", source).unwrap_or_else(|| "__anonymous".into()),
        },
        "method_declaration" => NodeKind::Method {
            name: field_text(node, "name", source).unwrap_or_else(|| "__anonymous".into()),
        },
        "anonymous_function" | "anonymous_function_creation_expression" => NodeKind::Closure,
        "arrow_function" => NodeKind::ArrowFunction,
        "class_declaration" | "interface_declaration" | "trait_declaration"
        | "enum_declaration" => NodeKind::ClassLike {
            name: field_text(node, "name", source),
        },
        "anonymous_class" => NodeKind::ClassLike { name: None },
        // Older grammars put the anonymous class body straight under `new`.
        "object_creation_expression" if has_named_child(node, "declaration_list") => {
            NodeKind::ClassLike { name: None }
        }
        "return_statement" => NodeKind::Return,
        "array_creation_expression" => NodeKind::ArrayLiteral {
            entries: array_entries(node, source),
        },
        "parenthesized_expression" => NodeKind::Parenthesized,
        "comment" => NodeKind::Comment,
        _ => NodeKind::Other,
    }
}

fn has_named_child(node: &tree_sitter::Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn array_entries(array: &tree_sitter::Node, source: &[u8]) -> Vec<ArrayEntry> {
    let mut entries = Vec::new();
    let mut cursor = array.walk();
    for element in array.named_children(&mut cursor) {
        if element.kind() != "array_element_initializer" {
            continue;
        }
        let mut inner = element.walk();
        let parts: Vec<_> = element
            .children(&mut inner)
            .filter(|c| c.kind() != "comment")
            .collect();

        if parts.iter().any(|p| p.kind() == "variadic_unpacking") {
            continue;
        }
        let has_arrow = parts.iter().any(|p| p.kind() == "=>");
        let key = if has_arrow {
            let key_node = parts.iter().find(|p| p.is_named());
            Some(key_node.map_or(ArrayKey::Dynamic, |k| classify_key(k, source)))
        } else {
            None
        };
        entries.push(ArrayEntry { key });
    }
    entries
}

/// Node kinds that carry only literal text inside strings and heredocs.
const LITERAL_STRING_PARTS: &[&str] = &[
    "string_content",
    "string_value",
    "escape_sequence",
    "heredoc_start",
    "heredoc_end",
    "heredoc_body",
    "nowdoc_body",
    "nowdoc_string",
];

fn classify_key(node: &tree_sitter::Node, source: &[u8]) -> ArrayKey {
    let text = node_text(node, source);
    let decoded = match node.kind() {
        "string" => literal::single_quoted(text).map(ArrayKey::Str),
        "encapsed_string" if only_literal_parts(node) => {
            literal::double_quoted(text).map(ArrayKey::Str)
        }
        "nowdoc" => literal::heredoc(text).map(ArrayKey::Str),
        "heredoc" if only_literal_parts(node) => literal::heredoc(text).map(ArrayKey::Str),
        "integer" => literal::integer(text).map(ArrayKey::Int),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|c| c.kind() != "comment");
            inner.map(|inner| classify_key(&inner, source))
        }
        _ => None,
    };
    decoded.unwrap_or(ArrayKey::Dynamic)
}

fn only_literal_parts(node: &tree_sitter::Node) -> bool {
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children
        .iter()
        .all(|c| LITERAL_STRING_PARTS.contains(&c.kind()) && only_literal_parts(c))
}
