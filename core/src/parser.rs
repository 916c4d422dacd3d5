//! PHP parser adapter over tree-sitter.
//!
//! tree-sitter recovers from every syntax error, so the adapter treats a tree
//! containing ERROR or MISSING nodes as a failed parse. This keeps the shape
//! collection restricted to files a strict PHP parser would accept.

use tracing::trace;
use tree_sitter::{Node, Parser};

use crate::error::{AnalysisError, ParseError};
use crate::tree::SyntaxTree;

const MAX_TOKEN_CHARS: usize = 40;

pub struct PhpParser {
    parser: Parser,
}

impl PhpParser {
    pub fn new() -> Result<Self, AnalysisError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into())?;
        Ok(Self { parser })
    }

    /// Parse one file's source. `file` is used for error attribution only.
    pub fn parse(&mut self, file: &str, source: &str) -> Result<SyntaxTree, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(file, "Failed to parse file"))?;
        let root = tree.root_node();
        if root.has_error() {
            let message = first_syntax_error(root, source.as_bytes())
                .unwrap_or_else(|| "Syntax error".to_string());
            return Err(ParseError::new(file, message));
        }
        let lowered = SyntaxTree::lower(root, source.as_bytes());
        trace!(file, nodes = lowered.len(), "lowered syntax tree");
        Ok(lowered)
    }
}

/// Describe the first ERROR or MISSING node in document order.
fn first_syntax_error(root: Node, source: &[u8]) -> Option<String> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let line = node.start_position().row + 1;
        if node.is_missing() {
            return Some(format!("Syntax error, missing '{}' on line {line}", node.kind()));
        }
        if node.is_error() {
            let token = first_token_text(node, source);
            return Some(if token.is_empty() {
                format!("Syntax error, unexpected end of file on line {line}")
            } else {
                format!("Syntax error, unexpected '{token}' on line {line}")
            });
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node
            .children(&mut cursor)
            .filter(|c| c.has_error() || c.is_missing())
            .collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn first_token_text(node: Node, source: &[u8]) -> String {
    let mut leaf = node;
    while let Some(child) = leaf.child(0) {
        leaf = child;
    }
    let text = leaf.utf8_text(source).unwrap_or("");
    let first_line = text.lines().next().unwrap_or("").trim();
    first_line.chars().take(MAX_TOKEN_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_php() {
        let mut parser = PhpParser::new().unwrap();
        let tree = parser
            .parse("ok.php", "<?php\nfunction get() { return ['a' => 1]; }\n")
            .unwrap();
        assert!(tree.len() > 1);
    }

    #[test]
    fn empty_file_is_a_valid_program() {
        let mut parser = PhpParser::new().unwrap();
        let tree = parser.parse("empty.php", "").unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn syntax_errors_become_parse_errors() {
        let mut parser = PhpParser::new().unwrap();
        let err = parser
            .parse("broken.php", "<?php\nfunction broken( {\n  return ['a' => 1];\n")
            .unwrap_err();
        assert_eq!(err.file, "broken.php");
        assert!(err.message.starts_with("Syntax error"), "{}", err.message);
        assert!(err.message.contains("on line"), "{}", err.message);
    }

    #[test]
    fn parser_is_reusable_after_a_failure() {
        let mut parser = PhpParser::new().unwrap();
        assert!(parser.parse("bad.php", "<?php\nclass {").is_err());
        assert!(parser.parse("good.php", "<?php\necho 1;\n").is_ok());
    }
}
