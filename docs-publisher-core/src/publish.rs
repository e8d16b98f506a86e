//! # publish: mirror a generated site to the object store
//!
//! Routing is decided only by the top-level entry name:
//!   - names in the main-content allow-list go to the bucket root
//!   - everything else goes under the version's target prefix
//!
//! Directories are mirrored with sync-with-delete so stale remote files are
//! pruned; plain files are copied and never delete siblings. Every publish
//! ends with a distribution-wide CDN invalidation.
//!
//! [`PublishMode::DryRun`] logs each remote command instead of running it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::PublishSettings;
use crate::contract::{ExternalTool, ToolCall};
use crate::error::PublishError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishMode {
    /// Log the remote commands without executing them.
    #[default]
    DryRun,
    /// Execute the remote commands.
    Live,
}

impl std::str::FromStr for PublishMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry-run" | "dryrun" | "dry_run" => Ok(PublishMode::DryRun),
            "live" => Ok(PublishMode::Live),
            other => Err(format!("unknown publish mode {other:?}, expected dry-run or live")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Single file copy.
    Copy,
    /// Directory mirror that deletes remote files missing locally.
    Sync,
}

/// One routed top-level entry of the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishAction {
    pub entry: String,
    pub source: PathBuf,
    pub kind: TransferKind,
    /// Object key (or key prefix for directories), without a leading slash.
    pub key: String,
    /// Whether the entry was routed to the bucket root.
    pub main_content: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub mode: PublishMode,
    pub actions: Vec<PublishAction>,
    pub invalidated: bool,
}

/// Joins key segments with `/`, dropping empty segments and stray slashes.
pub fn join_key<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|s| s.as_ref().trim_matches('/').to_owned())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Routes every top-level entry of `output_dir`, sorted by name.
pub fn plan(
    output_dir: &Path,
    main_content: &[String],
    target_prefix: &str,
) -> Result<Vec<PublishAction>, PublishError> {
    if !output_dir.is_dir() {
        return Err(PublishError::NotADirectory {
            path: output_dir.to_path_buf(),
        });
    }
    let allow: HashSet<&str> = main_content.iter().map(String::as_str).collect();

    let io_err = |source: std::io::Error| PublishError::Io {
        path: output_dir.to_path_buf(),
        source,
    };

    let mut actions = Vec::new();
    for entry in fs::read_dir(output_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let source = entry.path();
        let entry_name = entry
            .file_name()
            .into_string()
            .map_err(|_| PublishError::InvalidEntryName {
                path: source.clone(),
            })?;

        let kind = if source.is_dir() {
            TransferKind::Sync
        } else {
            TransferKind::Copy
        };
        let is_main = allow.contains(entry_name.as_str());
        let key = if is_main {
            entry_name.clone()
        } else {
            join_key([target_prefix, entry_name.as_str()])
        };

        actions.push(PublishAction {
            entry: entry_name,
            source,
            kind,
            key,
            main_content: is_main,
        });
    }
    actions.sort_by(|a, b| a.entry.cmp(&b.entry));
    Ok(actions)
}

pub struct Publisher<'a> {
    remote: &'a dyn ExternalTool,
    settings: &'a PublishSettings,
}

impl<'a> Publisher<'a> {
    pub fn new(remote: &'a dyn ExternalTool, settings: &'a PublishSettings) -> Self {
        Self { remote, settings }
    }

    /// Publishes `output_dir` and invalidates the CDN.
    pub async fn publish(
        &self,
        output_dir: &Path,
        target_prefix: &str,
    ) -> Result<PublishReport, PublishError> {
        let actions = plan(output_dir, &self.settings.main_content, target_prefix)?;
        info!(
            mode = ?self.settings.mode,
            bucket = %self.settings.bucket,
            target_prefix = %target_prefix,
            entries = actions.len(),
            "[PUBLISH] Starting publish"
        );

        for action in &actions {
            self.run(self.transfer_call(action)).await?;
        }
        self.run(self.invalidation_call()).await?;

        info!(mode = ?self.settings.mode, "[PUBLISH] Publish complete");
        Ok(PublishReport {
            mode: self.settings.mode,
            actions,
            invalidated: self.settings.mode == PublishMode::Live,
        })
    }

    pub fn transfer_call(&self, action: &PublishAction) -> ToolCall {
        let destination = format!("s3://{}/{}", self.settings.bucket, action.key);
        let source = action.source.display().to_string();
        match action.kind {
            TransferKind::Copy => {
                ToolCall::new(["s3".to_owned(), "cp".to_owned(), source, destination])
            }
            TransferKind::Sync => ToolCall::new([
                "s3".to_owned(),
                "sync".to_owned(),
                "--delete".to_owned(),
                source,
                destination,
            ]),
        }
    }

    pub fn invalidation_call(&self) -> ToolCall {
        ToolCall::new([
            "cloudfront",
            "create-invalidation",
            "--distribution-id",
            self.settings.distribution_id.as_str(),
            "--paths",
            "/*",
        ])
    }

    async fn run(&self, call: ToolCall) -> Result<(), PublishError> {
        match self.settings.mode {
            PublishMode::DryRun => {
                info!(command = %format!("aws {}", call.display_args()), "[PUBLISH][DRY-RUN] Skipping remote command");
                Ok(())
            }
            PublishMode::Live => {
                info!(command = %format!("aws {}", call.display_args()), "[PUBLISH] Running remote command");
                self.remote.execute(call).await.map(|_| ()).map_err(|e| {
                    error!(error = %e, "[PUBLISH][ERROR] Remote command failed");
                    PublishError::Tool(e)
                })
            }
        }
    }
}
