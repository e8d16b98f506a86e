//! Version resolution: short version derivation and tag lookup.

use std::cmp::Ordering;
use tracing::{debug, error, info};

use crate::contract::{ExternalTool, ToolCall};
use crate::error::ResolveError;
use crate::workspace::LibraryWorkspace;

/// A version spec resolved against the available tags.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedVersion {
    /// The requested spec, e.g. `0.10.4`.
    pub spec: String,
    /// First two components of the spec, e.g. `0.10`.
    pub short_version: String,
    /// Highest tag starting with `spec`.
    pub tag: String,
}

/// Returns the first two dot-separated components of `spec`.
///
/// `"0.10.4"` gives `"0.10"`, `"1.2"` stays `"1.2"` and `"1"` stays `"1"`.
pub fn short_version(spec: &str) -> Result<String, ResolveError> {
    let spec = spec.trim();
    let mut parts = spec.split('.');
    let major = parts.next().unwrap_or_default();
    if major.is_empty() {
        return Err(ResolveError::InvalidVersion {
            spec: spec.to_owned(),
        });
    }
    match parts.next() {
        Some(minor) if !minor.is_empty() => Ok(format!("{major}.{minor}")),
        Some(_) => Err(ResolveError::InvalidVersion {
            spec: spec.to_owned(),
        }),
        None => Ok(major.to_owned()),
    }
}

/// Compares two strings the way `sort -V` does.
///
/// Both strings are split into alternating runs of digits and non-digits.
/// Digit runs compare numerically (leading zeros ignored), other runs compare
/// byte-wise. Equal strings under this order fall back to plain comparison so
/// the result is total.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l, r) {
                    (Chunk::Digits(l), Chunk::Digits(r)) => cmp_digits(l, r),
                    (Chunk::Text(l), Chunk::Text(r)) => l.cmp(r),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn cmp_digits(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}

/// Picks the highest tag (by [`version_cmp`]) whose name starts with `spec`.
///
/// Pure: the same tag set always yields the same answer regardless of order.
pub fn resolve<S: AsRef<str>>(spec: &str, tags: &[S]) -> Result<ResolvedVersion, ResolveError> {
    let spec = spec.trim();
    let short_version = short_version(spec)?;

    let tag = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty() && t.starts_with(spec))
        .max_by(|a, b| version_cmp(a, b))
        .ok_or_else(|| ResolveError::NoMatchingTag {
            spec: spec.to_owned(),
        })?;

    Ok(ResolvedVersion {
        spec: spec.to_owned(),
        short_version,
        tag: tag.to_owned(),
    })
}

/// Lists the tags of `workspace` with `git` and resolves `spec` against them.
pub async fn resolve_in(
    workspace: &LibraryWorkspace,
    git: &dyn ExternalTool,
    spec: &str,
) -> Result<ResolvedVersion, ResolveError> {
    info!(spec = %spec, repo = %workspace.name(), "[RESOLVE] Listing tags");
    let output = git
        .execute(ToolCall::new(["tag", "--list"]).in_dir(workspace.path()))
        .await?;
    let tags: Vec<&str> = output.stdout.lines().collect();
    debug!(count = tags.len(), "[RESOLVE] Tags listed");

    match resolve(spec, &tags) {
        Ok(resolved) => {
            info!(
                spec = %resolved.spec,
                short_version = %resolved.short_version,
                tag = %resolved.tag,
                "[RESOLVE] Version resolved"
            );
            Ok(resolved)
        }
        Err(e) => {
            error!(spec = %spec, error = %e, "[RESOLVE][ERROR] Version resolution failed");
            Err(e)
        }
    }
}
