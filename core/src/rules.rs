//! Shape aggregation and rule evaluation.
//!
//! Rules are pure functions over the collected [`ShapeRecord`]s. The only
//! rule today flags returns that lack keys the configuration expects.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RuleConfig;
use crate::shapes::ShapeRecord;

pub const MISSING_KEYS_ID: &str = "ast-001-missing-keys";

/// Rules selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    #[default]
    ReturnArrayShape,
}

impl Rule {
    pub const ALL: &'static [Rule] = &[Rule::ReturnArrayShape];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::ReturnArrayShape => "return-array-shape",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .iter()
            .copied()
            .find(|rule| rule.as_str() == s.trim())
            .ok_or_else(|| {
                let known: Vec<_> = Rule::ALL.iter().map(Rule::as_str).collect();
                format!("unknown rule `{s}` (expected one of: {})", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// One rule violation, tied to a single shape record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub severity: Severity,
    pub impact: Impact,
    pub file: String,
    pub line: u32,
    pub message: String,
    /// Reserved; always empty for AST findings.
    pub code: String,
    /// Keys of the offending return.
    pub context: Vec<String>,
    pub guards: Vec<String>,
    pub sanitizers: Vec<String>,
}

/// Records sharing one `file::scope` key, in traversal order.
#[derive(Debug)]
pub struct ScopeGroup<'a> {
    pub key: String,
    pub records: Vec<&'a ShapeRecord>,
}

/// Group records by `file::scope`, keeping groups in order of first
/// appearance.
pub fn group_by_scope(records: &[ShapeRecord]) -> Vec<ScopeGroup<'_>> {
    let mut groups: Vec<ScopeGroup<'_>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let key = record.group_key();
        match index.get(&key) {
            Some(&slot) => groups[slot].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ScopeGroup {
                    key,
                    records: vec![record],
                });
            }
        }
    }
    groups
}

struct ScopePattern {
    raw: String,
    glob: Option<GlobMatcher>,
}

/// Selects which scope groups a rule inspects.
///
/// A pattern matches when it matches as a glob or occurs as a substring;
/// either is enough. No patterns means every scope matches.
pub struct ScopeFilter {
    patterns: Vec<ScopePattern>,
}

impl ScopeFilter {
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .map(|raw| {
                let glob = match Glob::new(raw) {
                    Ok(glob) => Some(glob.compile_matcher()),
                    Err(err) => {
                        debug!(pattern = %raw, error = %err, "scope pattern is not a valid glob");
                        None
                    }
                };
                ScopePattern {
                    raw: raw.clone(),
                    glob,
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, key: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        self.patterns.iter().any(|pattern| {
            pattern
                .glob
                .as_ref()
                .is_some_and(|glob| glob.is_match(key))
                || key.contains(pattern.raw.as_str())
        })
    }
}

/// Run `rule` over every collected record.
pub fn evaluate(rule: Rule, records: &[ShapeRecord], config: &RuleConfig) -> Vec<Finding> {
    match rule {
        Rule::ReturnArrayShape => missing_keys(records, config),
    }
}

fn missing_keys(records: &[ShapeRecord], config: &RuleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    if config.expected_keys.is_empty() {
        return findings;
    }
    let filter = ScopeFilter::new(&config.target_scopes);

    for group in group_by_scope(records) {
        if !filter.matches(&group.key) {
            continue;
        }
        for record in group.records {
            let missing: Vec<&str> = config
                .expected_keys
                .iter()
                .filter(|key| !record.keys.contains(*key))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                continue;
            }
            findings.push(Finding {
                id: MISSING_KEYS_ID.to_string(),
                severity: Severity::Warning,
                impact: Impact::Medium,
                file: record.file.clone(),
                line: record.line,
                message: format!(
                    "Return array in {} is missing expected keys: {}",
                    record.scope,
                    missing.join(", ")
                ),
                code: String::new(),
                context: record.keys.clone(),
                guards: Vec::new(),
                sanitizers: Vec::new(),
            });
        }
    }
    findings
}
