//! # contract: capability interface for external tools
//!
//! Every side effect the pipeline delegates to another program (git, the doc
//! build toolchain, the static site generator, the object store CLI) goes
//! through the single-method [`ExternalTool`] trait. Orchestration code never
//! spawns processes itself, so tests can swap in [`MockExternalTool`].
//!
//! ## Implementations
//! - [`ProcessTool`]: runs a real program and waits for it to finish.
//! - `MockExternalTool`: generated by `mockall` (feature `test-export-mocks`).
//!
//! Calls are awaited one at a time by the callers; nothing here runs in
//! parallel.

use async_trait::async_trait;
use mockall::automock;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::error::ToolError;

/// One invocation of an external tool: arguments, working directory and
/// extra environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCall {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl ToolCall {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Space-joined arguments, for logs and dry-run output.
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// A capability to run one external program.
///
/// Implementors must return `Err` for any unsuccessful exit; callers rely on
/// that to stop the pipeline at the first failure.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ExternalTool: Send + Sync {
    async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError>;
}

/// Runs a program on the local machine, inheriting the current environment.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    program: String,
    base_args: Vec<String>,
}

impl ProcessTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments prepended to every call, e.g. `bundle exec jekyll`.
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl ExternalTool for ProcessTool {
    async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.base_args).args(&call.args);
        if let Some(dir) = &call.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &call.envs {
            cmd.env(key, value);
        }

        debug!(
            program = %self.program,
            args = %call.display_args(),
            cwd = ?call.cwd,
            "Launching external tool"
        );

        let output = cmd.output().await.map_err(|e| {
            error!(error = ?e, program = %self.program, "Failed to launch external tool");
            ToolError::Launch {
                program: self.program.clone(),
                source: e,
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            error!(
                program = %self.program,
                args = %call.display_args(),
                status = ?output.status,
                stderr = %stderr.trim(),
                "External tool exited with non-zero status"
            );
            return Err(ToolError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: stderr.trim().to_owned(),
            });
        }

        info!(
            program = %self.program,
            args = %call.display_args(),
            "External tool finished"
        );
        Ok(ToolOutput { stdout, stderr })
    }
}

/// The set of collaborators the pipeline talks to.
pub struct Toolchain {
    /// Source control (`git`).
    pub git: Box<dyn ExternalTool>,
    /// Per-library doc build toolchain (`./gradlew`).
    pub build: Box<dyn ExternalTool>,
    /// Static site generator (`bundle exec jekyll`).
    pub site: Box<dyn ExternalTool>,
    /// Object store and CDN CLI (`aws`).
    pub remote: Box<dyn ExternalTool>,
}
