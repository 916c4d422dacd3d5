//! Collection of array-literal return shapes.

use serde::{Deserialize, Serialize};

use crate::scope::resolve_scope;
use crate::tree::{ArrayEntry, ArrayKey, NodeKind, SyntaxTree};

/// Placeholder key for entries whose key is not a literal.
pub const DYNAMIC_KEY: &str = "{dynamic}";

/// One `return [...]` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub file: String,
    pub scope: String,
    /// 1-based line of the `return` keyword.
    pub line: u32,
    /// Keys in declaration order; list entries get their positional index.
    pub keys: Vec<String>,
    pub all_keys_literal: bool,
}

impl ShapeRecord {
    pub fn from_entries(
        file: impl Into<String>,
        scope: impl Into<String>,
        line: u32,
        entries: &[ArrayEntry],
    ) -> Self {
        let mut keys = Vec::with_capacity(entries.len());
        let mut next_index = 0usize;
        let mut all_keys_literal = true;

        for entry in entries {
            match &entry.key {
                Some(ArrayKey::Str(value)) => keys.push(value.clone()),
                Some(ArrayKey::Int(value)) => keys.push(value.to_string()),
                Some(ArrayKey::Dynamic) => {
                    keys.push(DYNAMIC_KEY.to_string());
                    all_keys_literal = false;
                }
                None => {
                    keys.push(next_index.to_string());
                    next_index += 1;
                }
            }
        }

        Self {
            file: file.into(),
            scope: scope.into(),
            line,
            keys,
            all_keys_literal,
        }
    }

    /// Grouping key shared by every return in the same callable of a file.
    pub fn group_key(&self) -> String {
        format!("{}::{}", self.file, self.scope)
    }
}

/// Extract the shape of every array-literal return in one file, in source
/// order. Closures nested inside a returned array are visited too.
pub fn collect_shapes(tree: &SyntaxTree, file: &str) -> Vec<ShapeRecord> {
    let mut records = Vec::new();
    for id in tree.ids() {
        let Some(value) = tree.return_value(id) else {
            continue;
        };
        if let NodeKind::ArrayLiteral { entries } = &tree.node(value).kind {
            let scope = resolve_scope(tree, id);
            records.push(ShapeRecord::from_entries(
                file,
                scope.to_string(),
                tree.node(id).line,
                entries,
            ));
        }
    }
    records
}

/// Append-only accumulator of shape records across the files of one run.
#[derive(Debug, Default)]
pub struct ReturnShapeVisitor {
    records: Vec<ShapeRecord>,
}

impl ReturnShapeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit one file's tree and return how many records it contributed.
    pub fn visit(&mut self, tree: &SyntaxTree, file: &str) -> usize {
        let found = collect_shapes(tree, file);
        let count = found.len();
        self.records.extend(found);
        count
    }

    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ShapeRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop everything collected so far.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}
