//! Static site generation for one version.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::SiteSettings;
use crate::contract::{ExternalTool, ToolCall};
use crate::error::SiteError;

/// Runs the generator configured in [`SiteSettings::generator`]; the tool is
/// expected to carry that command prefix itself and only receives the
/// source, destination and base URL flags.
pub struct SiteAssembler<'a> {
    generator: &'a dyn ExternalTool,
    settings: &'a SiteSettings,
}

impl<'a> SiteAssembler<'a> {
    pub fn new(generator: &'a dyn ExternalTool, settings: &'a SiteSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Empties the aggregated docs directory so each version starts fresh.
    pub fn reset_docs_dir(&self) -> Result<(), SiteError> {
        let dir = &self.settings.docs_dir;
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        info!(path = %dir.display(), "[SITE] Reset aggregated docs directory");
        Ok(())
    }

    /// Copies `<sidebar_root>/<short_version>/*` into the data directory.
    ///
    /// Sidebar files left by a previous version are removed first. Returns the
    /// number of files copied; a missing sidebar directory is skipped.
    pub fn prepare_sidebar(&self, short_version: &str) -> Result<usize, SiteError> {
        let Some(root) = &self.settings.sidebar_root else {
            return Ok(0);
        };
        self.clear_sidebar(root)?;
        let source = root.join(short_version);
        if !source.is_dir() {
            info!(path = %source.display(), "[SITE] No sidebar for version, skipping");
            return Ok(0);
        }

        let data_dir = &self.settings.data_dir;
        fs::create_dir_all(data_dir).map_err(|e| io_err(data_dir, e))?;

        let mut copied = 0;
        for entry in fs::read_dir(&source).map_err(|e| io_err(&source, e))? {
            let entry = entry.map_err(|e| io_err(&source, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let dest = data_dir.join(entry.file_name());
            fs::copy(&path, &dest).map_err(|e| io_err(&dest, e))?;
            copied += 1;
        }
        info!(short_version = %short_version, files = copied, "[SITE] Sidebar prepared");
        Ok(copied)
    }

    /// Removes from the data directory every file named like a file in any
    /// version's sidebar directory.
    fn clear_sidebar(&self, root: &Path) -> Result<(), SiteError> {
        let data_dir = &self.settings.data_dir;
        if !root.is_dir() || !data_dir.is_dir() {
            return Ok(());
        }

        let mut removed = 0;
        for version_dir in fs::read_dir(root).map_err(|e| io_err(root, e))? {
            let version_dir = version_dir.map_err(|e| io_err(root, e))?.path();
            if !version_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&version_dir).map_err(|e| io_err(&version_dir, e))? {
                let entry = entry.map_err(|e| io_err(&version_dir, e))?;
                let stale = data_dir.join(entry.file_name());
                if stale.is_file() {
                    fs::remove_file(&stale).map_err(|e| io_err(&stale, e))?;
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(files = removed, "[SITE] Removed sidebar files of previous version");
        }
        Ok(())
    }

    /// Generates the site with `base_url_prefix` as its base path and returns
    /// the output directory.
    pub async fn assemble(&self, base_url_prefix: &str) -> Result<PathBuf, SiteError> {
        let source = &self.settings.source_dir;
        if !source.is_dir() {
            error!(path = %source.display(), "[SITE][ERROR] Site source missing");
            return Err(SiteError::MissingSource {
                path: source.clone(),
            });
        }

        for page in &self.settings.override_pages {
            let path = source.join(page);
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                info!(path = %path.display(), "[SITE] Removed override page");
            }
        }

        let output = &self.settings.output_dir;
        if output.exists() {
            fs::remove_dir_all(output).map_err(|e| io_err(output, e))?;
        }

        let base_url = base_url(base_url_prefix);
        let call = ToolCall::new([
            "--source".to_owned(),
            source.display().to_string(),
            "--destination".to_owned(),
            output.display().to_string(),
            "--baseurl".to_owned(),
            base_url.clone(),
        ])
        .env("JEKYLL_ENV", &self.settings.environment);

        info!(base_url = %base_url, source = %source.display(), "[SITE] Generating site");
        self.generator.execute(call).await.map_err(|e| {
            error!(error = %e, "[SITE][ERROR] Site generation failed");
            SiteError::Tool(e)
        })?;

        if !output.is_dir() {
            return Err(SiteError::MissingOutput {
                path: output.clone(),
            });
        }
        info!(output = %output.display(), "[SITE] Site generated");
        Ok(output.clone())
    }
}

/// `docs/0.10` becomes `/docs/0.10`; an empty prefix is the site root.
pub fn base_url(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn io_err(path: &Path, source: std::io::Error) -> SiteError {
    SiteError::Io {
        path: path.to_path_buf(),
        source,
    }
}
