//! Rule configuration loaded once per run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Settings for the return-array-shape rule.
///
/// The defaults (both lists empty) check every scope and require nothing,
/// so a run without configuration produces no findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Keys every array-literal return in a matched scope must contain.
    pub expected_keys: Vec<String>,
    /// Glob or substring patterns over `file::scope`; empty matches all.
    pub target_scopes: Vec<String>,
}

impl RuleConfig {
    /// Load a config file, falling back to defaults when it is absent,
    /// unreadable or malformed.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable config ignored");
                return Self::default();
            }
        };
        let parsed = if is_yaml(path) {
            serde_yaml::from_str::<Self>(&text).map_err(|e| e.to_string())
        } else {
            Self::from_json_str(&text).map_err(|e| e.to_string())
        };
        match parsed {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "invalid config ignored");
                Self::default()
            }
        }
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yml" | "yaml")
    )
}
