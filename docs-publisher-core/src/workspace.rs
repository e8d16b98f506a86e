//! Owned library checkouts.
//!
//! A [`LibraryWorkspace`] is the working copy of one manifest library. The
//! pipeline mutates it in place (checkout, patches, build output), so it is
//! always reset to a clean tree before it is reused.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::contract::{ExternalTool, ToolCall};
use crate::error::ToolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryWorkspace {
    name: String,
    path: PathBuf,
}

impl LibraryWorkspace {
    /// The checkout of `name` lives at `<root>/<name>`.
    pub fn new(root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = root.join(&name);
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a path relative to the checkout root.
    pub fn file(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Discards tracked modifications and removes untracked and ignored files.
    pub async fn reset(&self, git: &dyn ExternalTool) -> Result<(), ToolError> {
        git.execute(ToolCall::new(["reset", "--hard", "HEAD"]).in_dir(&self.path))
            .await?;
        git.execute(ToolCall::new(["clean", "-fdx"]).in_dir(&self.path))
            .await?;
        info!(library = %self.name, "[WORKSPACE] Reset to clean tree");
        Ok(())
    }

    /// Resets the checkout and moves it to `tag`.
    pub async fn checkout(&self, git: &dyn ExternalTool, tag: &str) -> Result<(), ToolError> {
        self.reset(git).await?;
        git.execute(ToolCall::new(["checkout", tag]).in_dir(&self.path))
            .await?;
        info!(library = %self.name, tag = %tag, "[WORKSPACE] Checked out tag");
        Ok(())
    }
}
