//! In-place textual patches applied to build and site configuration files.
//!
//! Every rule is idempotent: applying it a second time with the same inputs
//! leaves the file unchanged. Whether a rule that matches nothing is an error
//! is decided per rule by its `required` flag.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::error::PatchError;

/// What to change in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchAction {
    /// Replace every occurrence of `token` with `value`.
    Placeholder { token: String, value: String },
    /// Replace every line starting with `key` with `key=value`.
    KeyValue { key: String, value: String },
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
    /// Append `line` unless the file already contains it.
    AppendLine { line: String },
}

impl std::fmt::Display for PatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchAction::Placeholder { token, .. } => write!(f, "placeholder {token:?}"),
            PatchAction::KeyValue { key, .. } => write!(f, "key {key:?}"),
            PatchAction::Replace { from, .. } => write!(f, "replace {from:?}"),
            PatchAction::AppendLine { line } => write!(f, "append {line:?}"),
        }
    }
}

/// A [`PatchAction`] plus whether matching nothing is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
    pub action: PatchAction,
    pub required: bool,
}

impl PatchRule {
    /// Builds a rule with the default strictness for its kind: key=value rules
    /// must match, everything else tolerates files without a match.
    pub fn new(action: PatchAction) -> Self {
        let required = matches!(action, PatchAction::KeyValue { .. });
        Self { action, required }
    }

    pub fn placeholder(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PatchAction::Placeholder {
            token: token.into(),
            value: value.into(),
        })
    }

    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PatchAction::KeyValue {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(PatchAction::Replace {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn append_line(line: impl Into<String>) -> Self {
        Self::new(PatchAction::AppendLine { line: line.into() })
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Result of applying one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The file content changed.
    Changed { matches: usize },
    /// The file already had the desired content.
    Unchanged { matches: usize },
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, PatchOutcome::Changed { .. })
    }
}

/// Applies `rule` to the text file at `path` in place.
pub fn apply(path: &Path, rule: &PatchRule) -> Result<PatchOutcome, PatchError> {
    if !path.is_file() {
        error!(path = %path.display(), rule = %rule.action, "[PATCH][ERROR] Target file missing");
        return Err(PatchError::FileMissing {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|e| PatchError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let original = String::from_utf8(bytes).map_err(|_| PatchError::NotText {
        path: path.to_path_buf(),
    })?;

    let (patched, matches) = apply_to_str(&original, &rule.action)?;

    if matches == 0 && rule.required && !already_applied(&original, &rule.action) {
        error!(path = %path.display(), rule = %rule.action, "[PATCH][ERROR] Required rule matched nothing");
        return Err(PatchError::NoMatch {
            path: path.to_path_buf(),
            rule: rule.action.to_string(),
        });
    }

    if patched == original {
        debug!(path = %path.display(), rule = %rule.action, matches, "[PATCH] Already up to date");
        return Ok(PatchOutcome::Unchanged { matches });
    }

    fs::write(path, &patched).map_err(|e| PatchError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), rule = %rule.action, matches, "[PATCH] Applied");
    Ok(PatchOutcome::Changed { matches })
}

/// Whether a rule with no matches left has already done its work on `content`.
fn already_applied(content: &str, action: &PatchAction) -> bool {
    match action {
        PatchAction::Placeholder { token, value } => {
            !value.is_empty()
                && content.contains(value.as_str())
                && !content.contains(token.as_str())
        }
        PatchAction::Replace { from, to } => {
            !to.is_empty() && content.contains(to.as_str()) && !content.contains(from.as_str())
        }
        PatchAction::KeyValue { .. } | PatchAction::AppendLine { .. } => false,
    }
}

/// Applies `action` to `content`, returning the new text and the number of
/// matches found. [`PatchAction::AppendLine`] always reports one match, since
/// the line is present afterwards either way.
pub fn apply_to_str(content: &str, action: &PatchAction) -> Result<(String, usize), PatchError> {
    match action {
        PatchAction::Placeholder { token, value } => {
            if token.is_empty() {
                return Err(PatchError::InvalidRule {
                    reason: "placeholder token is empty".to_owned(),
                });
            }
            if value.contains(token.as_str()) {
                return Err(PatchError::InvalidRule {
                    reason: format!("value for placeholder {token:?} contains the token"),
                });
            }
            let matches = content.matches(token.as_str()).count();
            Ok((content.replace(token.as_str(), value), matches))
        }
        PatchAction::Replace { from, to } => {
            if from.is_empty() {
                return Err(PatchError::InvalidRule {
                    reason: "replacement source is empty".to_owned(),
                });
            }
            if to.contains(from.as_str()) {
                return Err(PatchError::InvalidRule {
                    reason: format!("replacement for {from:?} contains the original text"),
                });
            }
            let matches = content.matches(from.as_str()).count();
            Ok((content.replace(from.as_str(), to), matches))
        }
        PatchAction::KeyValue { key, value } => {
            if key.is_empty() {
                return Err(PatchError::InvalidRule {
                    reason: "key is empty".to_owned(),
                });
            }
            let pattern = Regex::new(&format!("^{}", regex::escape(key))).map_err(|e| {
                PatchError::InvalidRule {
                    reason: e.to_string(),
                }
            })?;
            let mut matches = 0;
            let mut out = String::with_capacity(content.len());
            for line in content.split_inclusive('\n') {
                if !pattern.is_match(line) {
                    out.push_str(line);
                    continue;
                }
                matches += 1;
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                if line.ends_with("\r\n") {
                    out.push_str("\r\n");
                } else if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok((out, matches))
        }
        PatchAction::AppendLine { line } => {
            let wanted = line.trim();
            if wanted.is_empty() {
                return Err(PatchError::InvalidRule {
                    reason: "line to append is empty".to_owned(),
                });
            }
            if content.lines().any(|l| l.trim() == wanted) {
                return Ok((content.to_owned(), 1));
            }
            let mut out = content.to_owned();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(wanted);
            out.push('\n');
            Ok((out, 1))
        }
    }
}
