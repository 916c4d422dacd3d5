//! File discovery and the per-file scan loop.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::RuleConfig;
use crate::error::{AnalysisError, ParseError};
use crate::parser::PhpParser;
use crate::report::{FileError, ScanReport};
use crate::rules::{evaluate, Rule};
use crate::shapes::{ReturnShapeVisitor, ShapeRecord};

pub const SOURCE_EXTENSION: &str = "php";

/// Result of expanding the requested paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSet {
    /// Absolute paths of PHP files, in scan order.
    pub files: Vec<PathBuf>,
    /// Requested paths that do not exist.
    pub missing: Vec<PathBuf>,
}

/// Expand files and directories into the list of PHP files to scan.
///
/// Directories are walked recursively in file-name order. Regular files
/// without a `.php` extension are ignored. Each file appears once.
pub fn collect_php_files<P: AsRef<Path>>(paths: &[P]) -> FileSet {
    let mut set = FileSet::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut push = |set: &mut FileSet, path: &Path| {
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if seen.insert(absolute.clone()) {
            set.files.push(absolute);
        }
    };

    for requested in paths {
        let requested = requested.as_ref();
        if requested.as_os_str().is_empty() {
            continue;
        }
        if !requested.exists() {
            set.missing.push(requested.to_path_buf());
            continue;
        }
        if requested.is_file() {
            if is_php(requested) {
                push(&mut set, requested);
            }
            continue;
        }
        for entry in WalkDir::new(requested).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            // Symlinks are not followed for traversal, but a link to a file
            // is scanned through its target.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if is_file && is_php(entry.path()) {
                push(&mut set, entry.path());
            }
        }
    }
    set
}

fn is_php(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}

/// Shapes and per-file failures gathered from one batch of files.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files_scanned: usize,
    pub shapes: Vec<ShapeRecord>,
    pub errors: Vec<FileError>,
}

/// Parses files one at a time and feeds them to the shape visitor.
pub struct Scanner {
    parser: PhpParser,
    visitor: ReturnShapeVisitor,
}

impl Scanner {
    pub fn new() -> Result<Self, AnalysisError> {
        Ok(Self {
            parser: PhpParser::new()?,
            visitor: ReturnShapeVisitor::new(),
        })
    }

    /// Parse and visit one file's source. The tree is dropped afterwards.
    pub fn scan_source(&mut self, file: &str, source: &str) -> Result<usize, ParseError> {
        let tree = self.parser.parse(file, source)?;
        Ok(self.visitor.visit(&tree, file))
    }

    /// Scan every file, recording read and parse failures instead of
    /// stopping. A failure in one file never affects another.
    pub fn scan_files<P: AsRef<Path>>(mut self, files: &[P]) -> ScanOutcome {
        let mut errors = Vec::new();
        for path in files {
            let path = path.as_ref();
            let file = path.to_string_lossy().into_owned();
            let source = match fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    debug!(file = %file, error = %err, "read failed");
                    errors.push(FileError {
                        file,
                        error: format!("Failed to read file: {err}"),
                    });
                    continue;
                }
            };
            match self.scan_source(&file, &source) {
                Ok(count) => debug!(file = %file, shapes = count, "scanned"),
                Err(err) => {
                    debug!(file = %file, error = %err.message, "parse failed");
                    errors.push(FileError {
                        file: err.file,
                        error: err.message,
                    });
                }
            }
        }
        ScanOutcome {
            files_scanned: files.len(),
            shapes: self.visitor.into_records(),
            errors,
        }
    }
}

/// Scan `files`, evaluate `rule` and build the report.
pub fn run_scan<P: AsRef<Path>>(
    rule: Rule,
    files: &[P],
    config: &RuleConfig,
) -> Result<ScanReport, AnalysisError> {
    let outcome = Scanner::new()?.scan_files(files);
    let findings = evaluate(rule, &outcome.shapes, config);
    debug!(
        files = outcome.files_scanned,
        shapes = outcome.shapes.len(),
        findings = findings.len(),
        errors = outcome.errors.len(),
        "scan complete"
    );
    Ok(ScanReport::new(
        rule,
        outcome.files_scanned,
        findings,
        outcome.shapes,
        outcome.errors,
    ))
}
