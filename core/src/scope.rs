//! Resolution of the callable that encloses a node.

use std::fmt;

use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Name used when a class or callable has no resolvable name.
pub const ANONYMOUS: &str = "__anonymous";
/// Scope of statements outside any function, method or closure.
pub const GLOBAL: &str = "__global__";

/// The enclosing callable of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Function(String),
    Method { class: String, method: String },
    /// Keyed by the closure's start line so every return inside one closure
    /// shares a scope.
    Closure { line: u32 },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str(GLOBAL),
            Scope::Function(name) => f.write_str(name),
            Scope::Method { class, method } => write!(f, "{class}::{method}"),
            Scope::Closure { line } => write!(f, "closure@line:{line}"),
        }
    }
}

/// Find the nearest function, method or closure above `node`.
///
/// Arrow functions are skipped: PHP does not allow a `return` statement
/// directly inside one, so they never own a return.
pub fn resolve_scope(tree: &SyntaxTree, node: NodeId) -> Scope {
    for ancestor in tree.ancestors(node) {
        let ancestor_node = tree.node(ancestor);
        match &ancestor_node.kind {
            NodeKind::Method { name } => {
                return Scope::Method {
                    class: enclosing_class_name(tree, ancestor),
                    method: name.clone(),
                };
            }
            NodeKind::Function { name } => return Scope::Function(name.clone()),
            NodeKind::Closure => {
                return Scope::Closure {
                    line: ancestor_node.line,
                }
            }
            _ => {}
        }
    }
    Scope::Global
}

fn enclosing_class_name(tree: &SyntaxTree, method: NodeId) -> String {
    tree.ancestors(method)
        .find_map(|id| match &tree.node(id).kind {
            // Traits, interfaces and enums name their methods like classes do.
            // Only anonymous classes fall back to `__anonymous`.
            NodeKind::ClassLike { name } => Some(name.clone()),
            _ => None,
        })
        .flatten()
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;

    fn scopes(source: &str) -> Vec<String> {
        let mut parser = PhpParser::new().unwrap();
        let tree = parser.parse("scope.php", source).unwrap();
        tree.ids()
            .filter(|id| tree.node(*id).kind == NodeKind::Return)
            .map(|id| resolve_scope(&tree, id).to_string())
            .collect()
    }

    #[test]
    fn top_level_return_is_global() {
        assert_eq!(scopes("<?php\nreturn ['a' => 1];\n"), vec!["__global__"]);
    }

    #[test]
    fn free_function_uses_its_name() {
        assert_eq!(
            scopes("<?php\nfunction get_data() { return []; }\n"),
            vec!["get_data"]
        );
    }

    #[test]
    fn returns_in_one_method_share_a_scope() {
        let src = r#"<?php
class Foo {
    public function bar($x) {
        if ($x) {
            return ['status' => 'ok'];
        }
        return ['status' => 'err'];
    }
}
"#;
        assert_eq!(scopes(src), vec!["Foo::bar", "Foo::bar"]);
    }

    #[test]
    fn closures_are_keyed_by_start_line() {
        let src = r#"<?php
$a = function () { return ['x' => 1]; };
$b = function () {
    return ['x' => 2];
};
"#;
        assert_eq!(scopes(src), vec!["closure@line:2", "closure@line:3"]);
    }

    #[test]
    fn anonymous_class_methods_use_placeholder() {
        let src = "<?php\n$o = new class { public function make() { return []; } };\n";
        assert_eq!(scopes(src), vec!["__anonymous::make"]);
    }

    #[test]
    fn trait_methods_use_the_trait_name() {
        let src = "<?php\ntrait Shapes { public function shape() { return []; } }\n";
        assert_eq!(scopes(src), vec!["Shapes::shape"]);
    }

    #[test]
    fn enum_methods_use_the_enum_name() {
        let src = "<?php\nenum Status { case On; public function label() { return []; } }\n";
        assert_eq!(scopes(src), vec!["Status::label"]);
    }

    #[test]
    fn closure_inside_method_owns_its_returns() {
        let src = r#"<?php
class Repo {
    public function all() {
        $map = function ($row) {
            return ['id' => $row];
        };
        return [];
    }
}
"#;
        assert_eq!(scopes(src), vec!["closure@line:4", "Repo::all"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut parser = PhpParser::new().unwrap();
        let tree = parser
            .parse("s.php", "<?php\nfunction f() { return [1]; }\n")
            .unwrap();
        let ret = tree
            .ids()
            .find(|id| tree.node(*id).kind == NodeKind::Return)
            .unwrap();
        assert_eq!(resolve_scope(&tree, ret), resolve_scope(&tree, ret));
        assert_eq!(resolve_scope(&tree, ret), Scope::Function("f".into()));
    }
}
