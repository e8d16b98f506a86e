//! Error types for every pipeline stage.
//!
//! Each stage has its own enum so callers (and tests) can match on the exact
//! failure. [`PipelineError`] wraps them for the orchestrator; there are no
//! retries anywhere, every error terminates the run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("{program} exited with code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Version resolution failures. Fatal before any build work starts.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid version spec {spec:?}")]
    InvalidVersion { spec: String },

    #[error("no tag matches version spec {spec:?}")]
    NoMatchingTag { spec: String },

    #[error("listing tags failed: {0}")]
    Tool(#[from] ToolError),
}

/// Content patching failures.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("patch target {path} does not exist")]
    FileMissing { path: PathBuf },

    #[error("patch target {path} is not UTF-8 text")]
    NotText { path: PathBuf },

    #[error("rule {rule} matched nothing in {path}")]
    NoMatch { path: PathBuf, rule: String },

    #[error("invalid patch rule: {reason}")]
    InvalidRule { reason: String },

    #[error("I/O error patching {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The discrete steps of a single library build, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Checkout,
    Assemble,
    ApiDocs,
    Validate,
    LocateOutput,
}

impl std::fmt::Display for BuildStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildStep::Checkout => "checkout",
            BuildStep::Assemble => "assemble",
            BuildStep::ApiDocs => "api-docs",
            BuildStep::Validate => "validate",
            BuildStep::LocateOutput => "locate-output",
        };
        f.write_str(name)
    }
}

/// Per-library build failures. Any of these aborts the whole pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{library}: {step} failed: {source}")]
    Step {
        library: String,
        step: BuildStep,
        #[source]
        source: ToolError,
    },

    #[error("{library}: patching failed: {source}")]
    Patch {
        library: String,
        #[source]
        source: PatchError,
    },

    #[error("{library}: generated docs not found ({detail})")]
    OutputNotFound { library: String, detail: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Static site generation failures.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("site source {path} does not exist")]
    MissingSource { path: PathBuf },

    #[error("site generator produced no output at {path}")]
    MissingOutput { path: PathBuf },

    #[error("site generator failed: {0}")]
    Tool(#[from] ToolError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Publishing failures.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish source {path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("entry name {path} is not valid UTF-8")]
    InvalidEntryName { path: PathBuf },

    #[error("remote command failed: {0}")]
    Tool(#[from] ToolError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Manifest and version-list failures.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest lists no libraries")]
    Empty,

    #[error("library {name} listed more than once")]
    Duplicate { name: String },

    #[error("tag source {name} is not in the manifest")]
    UnknownTagSource { name: String },
}

/// Top-level error returned by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
