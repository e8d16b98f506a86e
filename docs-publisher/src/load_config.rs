/// `load_config` module: Loads the static YAML config and merges the run
/// parameters and secrets from the environment into a [`PipelineConfig`].
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into typed settings (`read_config_file`)
/// - Inject `VERSION`, `S3_BUCKET`, `AWS_CLOUDFRONT_ID`, `JEKYLL_ENV`,
///   `S3_PREFIX` and `PUBLISH_MODE` from the environment (`load_config`)
/// - In live mode, insist that AWS credentials are present before any work
///   starts, since the aws CLI only reads them from the inherited environment
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use docs_publisher_core::config::{
    default_main_content, BuildSettings, PipelineConfig, PublishSettings, SiteSettings,
};
use docs_publisher_core::publish::PublishMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENV_VERSION: &str = "VERSION";
pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_DISTRIBUTION: &str = "AWS_CLOUDFRONT_ID";
pub const ENV_SITE_ENVIRONMENT: &str = "JEKYLL_ENV";
pub const ENV_S3_PREFIX: &str = "S3_PREFIX";
pub const ENV_PUBLISH_MODE: &str = "PUBLISH_MODE";
const CREDENTIAL_VARS: [&str; 2] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"];

/// The file-backed part of the configuration. Contains no secrets.
#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub workspace_root: PathBuf,
    pub manifest: PathBuf,
    #[serde(default)]
    pub version_list: Option<PathBuf>,
    #[serde(default)]
    pub tag_source: Option<String>,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub publish: PublishSection,
}

#[derive(Debug, Deserialize)]
pub struct PublishSection {
    #[serde(default = "default_main_content")]
    pub main_content: Vec<String>,
    #[serde(default)]
    pub s3_prefix: Option<String>,
    #[serde(default)]
    pub mode: Option<PublishMode>,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            main_content: default_main_content(),
            s3_prefix: None,
            mode: None,
        }
    }
}

/// Reads and parses the YAML config file without touching the environment.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads the YAML file and merges the environment into a full run config.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let file = read_config_file(path)?;

    let version = required_env(ENV_VERSION)?;
    let bucket = required_env(ENV_BUCKET)?;
    let distribution_id = required_env(ENV_DISTRIBUTION)?;

    let mode = match optional_env(ENV_PUBLISH_MODE) {
        Some(raw) => raw
            .parse::<PublishMode>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("{ENV_PUBLISH_MODE} is invalid"))?,
        None => file.publish.mode.unwrap_or_default(),
    };

    if mode == PublishMode::Live {
        for var in CREDENTIAL_VARS {
            let value = required_env(var).context("live publishing needs AWS credentials")?;
            info!(var, len = value.len(), "AWS credential found in env");
        }
    }

    let mut site = file.site;
    if let Some(environment) = optional_env(ENV_SITE_ENVIRONMENT) {
        site.environment = environment;
    }

    let s3_prefix = optional_env(ENV_S3_PREFIX).or(file.publish.s3_prefix);

    info!(
        version = %version,
        bucket = %bucket,
        mode = ?mode,
        "Config loaded and merged successfully"
    );

    Ok(PipelineConfig {
        version,
        workspace_root: file.workspace_root,
        manifest: file.manifest,
        version_list: file.version_list,
        tag_source: file.tag_source,
        build: file.build,
        site,
        publish: PublishSettings {
            bucket,
            distribution_id,
            s3_prefix,
            mode,
            main_content: file.publish.main_content,
        },
    })
}

pub fn required_env(name: &str) -> Result<String> {
    match optional_env(name) {
        Some(value) => Ok(value),
        None => {
            error!(var = name, "Required environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set"))
        }
    }
}

/// Reads a variable, treating an empty value as unset.
pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
