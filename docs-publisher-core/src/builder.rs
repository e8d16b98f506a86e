//! Per-library documentation build.
//!
//! For one library checkout and one resolved version this module:
//!   - resets the checkout and moves it to the resolved tag
//!   - patches the local build configuration for an isolated docs build
//!   - injects the shared documentation module into the module settings
//!   - runs the four toolchain operations (assemble, api-docs, validate,
//!     locate-output) strictly in order
//!
//! The first failing step aborts the library and, through the orchestrator,
//! the whole run. There is no rollback of libraries built earlier.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

use crate::config::BuildSettings;
use crate::contract::{ToolCall, Toolchain};
use crate::error::{BuildError, BuildStep, PatchError};
use crate::patch::{self, PatchAction, PatchRule};
use crate::version::ResolvedVersion;
use crate::workspace::LibraryWorkspace;

/// A library whose docs were generated successfully.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BuiltLibrary {
    pub name: String,
    pub tag: String,
    /// Absolute location of the generated docs inside the checkout.
    pub docs_dir: PathBuf,
}

pub struct DocBuilder<'a> {
    tools: &'a Toolchain,
    settings: &'a BuildSettings,
}

impl<'a> DocBuilder<'a> {
    pub fn new(tools: &'a Toolchain, settings: &'a BuildSettings) -> Self {
        Self { tools, settings }
    }

    pub async fn build(
        &self,
        workspace: &LibraryWorkspace,
        version: &ResolvedVersion,
    ) -> Result<BuiltLibrary, BuildError> {
        let library = workspace.name();
        info!(
            library = %library,
            tag = %version.tag,
            short_version = %version.short_version,
            "[BUILD] Starting library build"
        );

        workspace
            .checkout(self.tools.git.as_ref(), &version.tag)
            .await
            .map_err(|e| step_failed(library, BuildStep::Checkout, e))?;

        self.patch_workspace(workspace, version)?;

        self.run_step(workspace, BuildStep::Assemble, &self.settings.steps.assemble)
            .await?;
        self.run_step(workspace, BuildStep::ApiDocs, &self.settings.steps.api_docs)
            .await?;
        self.run_step(workspace, BuildStep::Validate, &self.settings.steps.validate)
            .await?;
        let located = self
            .run_step(
                workspace,
                BuildStep::LocateOutput,
                &self.settings.steps.locate_output,
            )
            .await?;

        let docs_dir = locate_docs_dir(workspace, &located)?;
        info!(
            library = %library,
            docs_dir = %docs_dir.display(),
            "[BUILD] Library build complete"
        );

        Ok(BuiltLibrary {
            name: library.to_owned(),
            tag: version.tag.clone(),
            docs_dir,
        })
    }

    fn patch_workspace(
        &self,
        workspace: &LibraryWorkspace,
        version: &ResolvedVersion,
    ) -> Result<(), BuildError> {
        let library = workspace.name();
        let patch_failed = |source: PatchError| BuildError::Patch {
            library: library.to_owned(),
            source,
        };

        for placeholder in &self.settings.version_placeholders {
            let rule = PatchRule::placeholder(&placeholder.token, &version.tag)
                .required(placeholder.required);
            patch::apply(&workspace.file(&placeholder.file), &rule).map_err(patch_failed)?;
        }

        let local = &self.settings.local_config;
        let rule = PatchRule::key_value(&local.key, &local.value).required(local.required);
        patch::apply(&workspace.file(&local.file), &rule).map_err(patch_failed)?;

        if let Some(docs_build) = &self.settings.docs_build_file {
            let path = workspace.file(&docs_build.file);
            if path.is_file() {
                let rule = PatchRule::replace(&docs_build.from, &docs_build.to)
                    .required(docs_build.required);
                patch::apply(&path, &rule).map_err(patch_failed)?;
            } else {
                info!(
                    library = %library,
                    path = %path.display(),
                    "[BUILD] No docs build file, skipping repository swap"
                );
            }
        }

        let rule = PatchRule::new(PatchAction::AppendLine {
            line: self.settings.doc_module.clone(),
        });
        patch::apply(&workspace.file(&self.settings.settings_file), &rule)
            .map_err(patch_failed)?;

        Ok(())
    }

    async fn run_step(
        &self,
        workspace: &LibraryWorkspace,
        step: BuildStep,
        command: &str,
    ) -> Result<String, BuildError> {
        info!(library = %workspace.name(), %step, command = %command, "[BUILD] Running step");
        match self
            .tools
            .build
            .execute(ToolCall::new([command]).in_dir(workspace.path()))
            .await
        {
            Ok(output) => Ok(output.stdout),
            Err(e) => {
                error!(library = %workspace.name(), %step, error = %e, "[BUILD][ERROR] Step failed");
                Err(step_failed(workspace.name(), step, e))
            }
        }
    }
}

fn step_failed(library: &str, step: BuildStep, source: crate::error::ToolError) -> BuildError {
    BuildError::Step {
        library: library.to_owned(),
        step,
        source,
    }
}

/// The first non-empty line of the locate step's output names the docs
/// directory, relative to the checkout unless absolute.
fn locate_docs_dir(workspace: &LibraryWorkspace, stdout: &str) -> Result<PathBuf, BuildError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BuildError::OutputNotFound {
            library: workspace.name().to_owned(),
            detail: "locate step printed nothing".to_owned(),
        })?;

    let candidate = Path::new(line);
    let dir = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        workspace.file(candidate)
    };

    if !dir.is_dir() {
        error!(library = %workspace.name(), path = %dir.display(), "[BUILD][ERROR] Located docs directory missing");
        return Err(BuildError::OutputNotFound {
            library: workspace.name().to_owned(),
            detail: format!("{} is not a directory", dir.display()),
        });
    }
    Ok(dir)
}

/// Copies the contents of a library's generated docs into `target`.
///
/// Later libraries overwrite files of earlier ones with the same relative path.
pub fn aggregate(built: &BuiltLibrary, target: &Path) -> Result<usize, BuildError> {
    let io_err = |path: &Path, source: std::io::Error| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut copied = 0;
    for entry in WalkDir::new(&built.docs_dir).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&built.docs_dir).to_path_buf();
            BuildError::Io {
                path,
                source: e.into(),
            }
        })?;
        let relative = entry
            .path()
            .strip_prefix(&built.docs_dir)
            .unwrap_or(entry.path());
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| io_err(&dest, e))?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            fs::copy(entry.path(), &dest).map_err(|e| io_err(&dest, e))?;
            copied += 1;
        }
    }

    info!(
        library = %built.name,
        files = copied,
        target = %target.display(),
        "[BUILD] Aggregated generated docs"
    );
    Ok(copied)
}
