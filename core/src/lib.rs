//! WPCC AST check core engine.
//! Parses PHP with tree-sitter, records the key shape of every
//! `return [...]` statement per enclosing scope, and flags returns that
//! miss keys the configuration expects.

pub mod config;
pub mod error;
pub mod literal;
pub mod parser;
pub mod report;
pub mod rules;
pub mod scan;
pub mod scope;
pub mod shapes;
pub mod tree;

pub use config::RuleConfig;
pub use error::{AnalysisError, ParseError};
pub use parser::PhpParser;
pub use report::{FileError, ScanReport, TextOptions};
pub use rules::{evaluate, Finding, Impact, Rule, Severity};
pub use scan::{collect_php_files, run_scan, FileSet, ScanOutcome, Scanner};
pub use scope::{resolve_scope, Scope};
pub use shapes::{collect_shapes, ReturnShapeVisitor, ShapeRecord};
pub use tree::{NodeId, NodeKind, SyntaxTree};
