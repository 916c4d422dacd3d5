use thiserror::Error;

/// Failures that stop an analysis run before any file is scanned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to load the PHP grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

/// A single file that could not be turned into a syntax tree.
///
/// Parse errors never abort a batch; the scan loop records them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}: {message}")]
pub struct ParseError {
    pub file: String,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}
