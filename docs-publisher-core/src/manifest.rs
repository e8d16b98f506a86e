//! Newline-delimited list files: the library manifest and the version list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ManifestError;

/// Non-empty, trimmed lines of `content`, skipping `#` comments.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Parses a library manifest, keeping order and rejecting duplicates.
pub fn parse_manifest(content: &str) -> Result<Vec<String>, ManifestError> {
    let libraries = parse_lines(content);
    if libraries.is_empty() {
        return Err(ManifestError::Empty);
    }
    let mut seen = HashSet::new();
    for name in &libraries {
        if !seen.insert(name.as_str()) {
            return Err(ManifestError::Duplicate { name: name.clone() });
        }
    }
    Ok(libraries)
}

pub fn read_manifest(path: &Path) -> Result<Vec<String>, ManifestError> {
    let content = fs::read_to_string(path).map_err(|e| ManifestError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let libraries = parse_manifest(&content)?;
    info!(path = %path.display(), count = libraries.len(), "[MANIFEST] Libraries loaded");
    Ok(libraries)
}

/// Reads the optional version list. A missing file yields no versions.
pub fn read_version_list(path: Option<&Path>) -> Result<Vec<String>, ManifestError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    if !path.exists() {
        info!(path = %path.display(), "[MANIFEST] No version list, skipping extra versions");
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| ManifestError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let versions = parse_lines(&content);
    info!(path = %path.display(), count = versions.len(), "[MANIFEST] Extra versions loaded");
    Ok(versions)
}
