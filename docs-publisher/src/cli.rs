///
/// This module implements the CLI interface for docs-publisher: command
/// parsing, config loading and user-visible output.
///
/// All pipeline logic lives in the [`docs-publisher-core`] crate; this module
/// only glues the loaded configuration to the process-backed tools.
///
/// ## Commands
/// - `publish`: build every manifest library for every configured version and
///   publish the generated site.
/// - `resolve`: print the short version and tag `VERSION` resolves to.
/// - `plan`: print how an already generated site would be routed.
///
/// [`docs-publisher-core`]: ../../docs-publisher-core/
use crate::load_config::{load_config, optional_env, read_config_file, required_env};
use crate::load_config::{ENV_S3_PREFIX, ENV_VERSION};
use crate::tools::process_toolchain;
use anyhow::Result;
use clap::{Parser, Subcommand};
use docs_publisher_core::contract::ProcessTool;
use docs_publisher_core::manifest::read_manifest;
use docs_publisher_core::pipeline::{self, tag_source, target_prefix};
use docs_publisher_core::publish::{plan, TransferKind};
use docs_publisher_core::version::{resolve_in, short_version};
use docs_publisher_core::workspace::LibraryWorkspace;
use std::path::PathBuf;

/// CLI for docs-publisher: build and publish versioned library documentation.
#[derive(Parser)]
#[clap(
    name = "docs-publisher",
    version,
    about = "Build versioned library documentation and publish it to S3/CloudFront"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline for VERSION (and any versions in the version list)
    Publish {
        /// Path to the YAML config file
        #[clap(long, env = "DOCS_PUBLISHER_CONFIG", default_value = "docs-publisher.yaml")]
        config: PathBuf,
    },
    /// Resolve VERSION to its short version and tag
    Resolve {
        /// Path to the YAML config file
        #[clap(long, env = "DOCS_PUBLISHER_CONFIG", default_value = "docs-publisher.yaml")]
        config: PathBuf,
    },
    /// Show where each entry of a generated site would be published
    Plan {
        /// Path to the YAML config file
        #[clap(long, env = "DOCS_PUBLISHER_CONFIG", default_value = "docs-publisher.yaml")]
        config: PathBuf,
        /// Generated site directory
        #[clap(long)]
        output_dir: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("cli_invoked");

    match cli.command {
        Commands::Publish { config } => {
            let config = load_config(config)?;
            let tools = process_toolchain(&config)?;
            tracing::info!(command = "publish", "Starting documentation pipeline");
            match pipeline::run(&config, &tools).await {
                Ok(report) => {
                    tracing::info!(
                        command = "publish",
                        versions = report.versions.len(),
                        "Pipeline complete"
                    );
                    println!("Publish complete.\nReport:");
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Pipeline failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Resolve { config } => {
            let file = read_config_file(config)?;
            let version = required_env(ENV_VERSION)?;
            let workspaces: Vec<LibraryWorkspace> = read_manifest(&file.manifest)?
                .into_iter()
                .map(|name| LibraryWorkspace::new(&file.workspace_root, name))
                .collect();
            let workspace = tag_source(&workspaces, file.tag_source.as_deref())?;
            let git = ProcessTool::new("git");
            let resolved = resolve_in(workspace, &git, &version).await?;
            println!("{} {}", resolved.short_version, resolved.tag);
            Ok(())
        }
        Commands::Plan { config, output_dir } => {
            let file = read_config_file(config)?;
            let version = required_env(ENV_VERSION)?;
            let short = short_version(&version)?;
            let prefix = target_prefix(
                optional_env(ENV_S3_PREFIX)
                    .or(file.publish.s3_prefix)
                    .as_deref(),
                &short,
            );
            let actions = plan(&output_dir, &file.publish.main_content, &prefix)?;
            for action in &actions {
                let kind = match action.kind {
                    TransferKind::Copy => "copy",
                    TransferKind::Sync => "sync",
                };
                println!("{kind}\t{}\t{}", action.entry, action.key);
            }
            Ok(())
        }
    }
}
