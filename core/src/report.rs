//! Serialization of scan results as JSON or human-readable text.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use console::Style;
use serde::{Deserialize, Serialize};

use crate::rules::{Finding, Rule};
use crate::shapes::ShapeRecord;

pub const SCAN_TYPE: &str = "ast-check";

/// A file that produced no shapes because it could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_type: String,
    pub rule: Rule,
    pub files_scanned: usize,
    pub findings: Vec<Finding>,
    pub shapes: Vec<ShapeRecord>,
    pub errors: Vec<FileError>,
}

/// Presentation knobs for [`ScanReport::render_text`].
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    pub color: bool,
    /// Show finding and error paths relative to this directory.
    pub base_dir: Option<PathBuf>,
}

impl ScanReport {
    pub fn new(
        rule: Rule,
        files_scanned: usize,
        findings: Vec<Finding>,
        shapes: Vec<ShapeRecord>,
        errors: Vec<FileError>,
    ) -> Self {
        Self {
            scan_type: SCAN_TYPE.to_string(),
            rule,
            files_scanned,
            findings,
            shapes,
            errors,
        }
    }

    /// Process exit status: findings fail the run, parse errors do not.
    pub fn exit_code(&self) -> i32 {
        if self.findings.is_empty() {
            0
        } else {
            1
        }
    }

    /// Pretty-printed JSON. serde_json never escapes `/`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self, options: &TextOptions) -> String {
        let bold = Style::new().bold().force_styling(options.color);
        let warn = Style::new().yellow().force_styling(options.color);
        let err = Style::new().red().force_styling(options.color);
        let dim = Style::new().dim().force_styling(options.color);
        let display = |file: &str| display_path(file, options.base_dir.as_deref());

        let mut out = String::new();
        let _ = writeln!(out, "{}", bold.apply_to("WPCC AST Check Results"));
        let _ = writeln!(out, "======================");
        let _ = writeln!(out);
        let _ = writeln!(out, "Rule: {}", self.rule);
        let _ = writeln!(out, "Files scanned: {}", self.files_scanned);
        let _ = writeln!(out, "Findings: {}", self.findings.len());
        let _ = writeln!(out, "Parse errors: {}", self.errors.len());
        let _ = writeln!(out);

        if !self.findings.is_empty() {
            let _ = writeln!(out, "{}", bold.apply_to("Findings:"));
            for finding in &self.findings {
                let _ = writeln!(
                    out,
                    "  [{}] {}:{}",
                    warn.apply_to(finding.severity),
                    display(&finding.file),
                    finding.line
                );
                let _ = writeln!(out, "    {}", finding.message);
                let _ = writeln!(out);
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "{}", bold.apply_to("Parse Errors:"));
            for error in &self.errors {
                let _ = writeln!(
                    out,
                    "  {}: {}",
                    display(&error.file),
                    err.apply_to(&error.error)
                );
            }
        }

        if !self.shapes.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", bold.apply_to("Detected Return Array Shapes:"));
            for shape in &self.shapes {
                let _ = writeln!(
                    out,
                    "  {}:{} - {}",
                    basename(&shape.file),
                    shape.line,
                    shape.scope
                );
                let _ = writeln!(
                    out,
                    "    {}",
                    dim.apply_to(format!("Keys: [{}]", shape.keys.join(", ")))
                );
            }
        }

        out
    }
}

fn basename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

fn display_path(file: &str, base: Option<&Path>) -> String {
    let Some(base) = base else {
        return file.to_string();
    };
    match pathdiff::diff_paths(file, base) {
        Some(rel) if !rel.starts_with("..") => rel.to_string_lossy().replace('\\', "/"),
        _ => file.to_string(),
    }
}
