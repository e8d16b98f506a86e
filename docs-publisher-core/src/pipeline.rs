//! High-level pipeline: resolve → patch/build every library → assemble → publish.
//!
//! This module orchestrates one complete documentation release for every
//! configured version:
//!   - Reads the library manifest and the optional version list
//!   - Resolves every version spec to a tag up front, so a bad spec fails
//!     before any build work
//!   - For each version, builds every manifest library in order and
//!     aggregates their generated docs into the site source
//!   - Generates the site under `docs/<short_version>` and publishes it
//!
//! # Ordering
//! Extra versions from the version list run first, the primary version runs
//! last, so the landing-page assets left at the bucket root belong to the
//! primary version.
//!
//! # Error Handling
//! Fail fast: the first error from any stage is returned as is. Nothing is
//! rolled back and no later stage is invoked.

use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::builder::{self, BuiltLibrary, DocBuilder};
use crate::config::PipelineConfig;
use crate::contract::Toolchain;
use crate::error::{ManifestError, PipelineError};
use crate::manifest;
use crate::publish::{join_key, PublishReport, Publisher};
use crate::site::SiteAssembler;
use crate::version::{self, ResolvedVersion};
use crate::workspace::LibraryWorkspace;

#[derive(Debug, serde::Serialize)]
pub struct PipelineReport {
    pub versions: Vec<VersionReport>,
}

#[derive(Debug, serde::Serialize)]
pub struct VersionReport {
    pub version: ResolvedVersion,
    pub libraries: Vec<BuiltLibrary>,
    pub site_output: PathBuf,
    pub target_prefix: String,
    pub publish: PublishReport,
}

/// URL path segment a version is served under, e.g. `docs/0.10`.
pub fn url_prefix(short_version: &str) -> String {
    join_key(["docs", short_version])
}

/// Object key prefix for a version's non-landing-page content.
pub fn target_prefix(s3_prefix: Option<&str>, short_version: &str) -> String {
    join_key([s3_prefix.unwrap_or_default(), url_prefix(short_version).as_str()])
}

/// Version specs in processing order: extra versions first (duplicates and
/// the primary removed), primary last.
pub fn version_order(primary: &str, extra: &[String]) -> Vec<String> {
    let primary = primary.trim();
    let mut ordered: Vec<String> = Vec::new();
    for spec in extra {
        let spec = spec.trim();
        if spec != primary && !ordered.iter().any(|s| s == spec) {
            ordered.push(spec.to_owned());
        }
    }
    ordered.push(primary.to_owned());
    ordered
}

/// The workspace whose tags drive version resolution: `name` when given,
/// otherwise the first manifest library.
pub fn tag_source<'a>(
    workspaces: &'a [LibraryWorkspace],
    name: Option<&str>,
) -> Result<&'a LibraryWorkspace, ManifestError> {
    match name {
        Some(name) => workspaces
            .iter()
            .find(|w| w.name() == name)
            .ok_or_else(|| ManifestError::UnknownTagSource {
                name: name.to_owned(),
            }),
        None => workspaces.first().ok_or(ManifestError::Empty),
    }
}

/// Runs the whole pipeline.
pub async fn run(
    config: &PipelineConfig,
    tools: &Toolchain,
) -> Result<PipelineReport, PipelineError> {
    info!("[PIPELINE] Starting documentation pipeline");
    config.trace_loaded();

    let libraries = manifest::read_manifest(&config.manifest)?;
    let extra = manifest::read_version_list(config.version_list.as_deref())?;
    let specs = version_order(&config.version, &extra);

    let workspaces: Vec<LibraryWorkspace> = libraries
        .iter()
        .map(|name| LibraryWorkspace::new(&config.workspace_root, name.as_str()))
        .collect();

    let tag_source = tag_source(&workspaces, config.tag_source.as_deref())?;

    let mut resolved = Vec::with_capacity(specs.len());
    for spec in &specs {
        resolved.push(version::resolve_in(tag_source, tools.git.as_ref(), spec).await?);
    }
    info!(versions = resolved.len(), "[PIPELINE] All versions resolved");

    let mut versions = Vec::with_capacity(resolved.len());
    for version in resolved {
        versions.push(run_version(config, tools, &workspaces, version).await?);
    }

    info!(versions = versions.len(), "[PIPELINE] Pipeline complete");
    Ok(PipelineReport { versions })
}

async fn run_version(
    config: &PipelineConfig,
    tools: &Toolchain,
    workspaces: &[LibraryWorkspace],
    version: ResolvedVersion,
) -> Result<VersionReport, PipelineError> {
    info!(spec = %version.spec, tag = %version.tag, "[PIPELINE] Building version");

    let site = SiteAssembler::new(tools.site.as_ref(), &config.site);
    site.reset_docs_dir()?;

    let doc_builder = DocBuilder::new(tools, &config.build);
    let mut libraries = Vec::with_capacity(workspaces.len());
    for workspace in workspaces {
        let built = match doc_builder.build(workspace, &version).await {
            Ok(built) => built,
            Err(e) => {
                error!(library = %workspace.name(), error = %e, "[PIPELINE][ERROR] Library build failed, aborting");
                return Err(e.into());
            }
        };
        builder::aggregate(&built, &config.site.docs_dir)?;
        libraries.push(built);
    }

    site.prepare_sidebar(&version.short_version)?;
    let site_output = site.assemble(&url_prefix(&version.short_version)).await?;

    let target_prefix = target_prefix(config.publish.s3_prefix.as_deref(), &version.short_version);
    let publisher = Publisher::new(tools.remote.as_ref(), &config.publish);
    let publish = publisher.publish(&site_output, &target_prefix).await?;

    match serde_json::to_string(&publish.actions) {
        Ok(json) => debug!(json = %json, "[PIPELINE][DEBUG] Published actions as JSON"),
        Err(e) => error!(error = ?e, "[PIPELINE][DEBUG] Failed to serialize publish actions"),
    }

    Ok(VersionReport {
        version,
        libraries,
        site_output,
        target_prefix,
        publish,
    })
}
