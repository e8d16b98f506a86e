//! Typed configuration for a pipeline run.
//!
//! The file-backed parts deserialize from YAML (see the CLI crate's
//! `load_config`); run parameters such as the version and the bucket come
//! from the environment and are filled in by the loader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::publish::PublishMode;

/// Everything one pipeline run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Primary version spec, e.g. `0.10.4`.
    pub version: String,
    /// Directory holding one checkout per manifest library.
    pub workspace_root: PathBuf,
    /// Newline-delimited library names, in build order.
    pub manifest: PathBuf,
    /// Optional newline-delimited list of extra version specs.
    #[serde(default)]
    pub version_list: Option<PathBuf>,
    /// Library whose tags drive resolution; defaults to the first manifest entry.
    #[serde(default)]
    pub tag_source: Option<String>,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub site: SiteSettings,
    pub publish: PublishSettings,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            version = %self.version,
            workspace_root = %self.workspace_root.display(),
            manifest = %self.manifest.display(),
            mode = ?self.publish.mode,
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

/// How each library is prepared and built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Shell used to run the step commands, e.g. `["sh", "-c"]`.
    pub shell: Vec<String>,
    /// Key=value substitution in the library's local build properties.
    pub local_config: KeyValuePatch,
    /// Repository coordinate swap in the docs build file, when it exists.
    pub docs_build_file: Option<ReplacePatch>,
    /// Module-settings file receiving the shared docs module reference.
    pub settings_file: PathBuf,
    /// Line injected into `settings_file`.
    pub doc_module: String,
    /// Files whose version token is replaced with the resolved tag.
    pub version_placeholders: Vec<PlaceholderPatch>,
    pub steps: BuildSteps,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            shell: vec!["sh".to_owned(), "-c".to_owned()],
            local_config: KeyValuePatch {
                file: PathBuf::from("gradle.properties"),
                key: "COMMON_SETUP".to_owned(),
                value: "../gradle/global-properties.gradle".to_owned(),
                required: true,
            },
            docs_build_file: Some(ReplacePatch {
                file: PathBuf::from("arrow-docs/build.gradle"),
                from: "mavenCentral()".to_owned(),
                to: "maven { url \"https://oss.jfrog.org/artifactory/oss-snapshot-local/\" }"
                    .to_owned(),
                required: false,
            }),
            settings_file: PathBuf::from("settings.gradle"),
            doc_module: "include ':arrow-docs'".to_owned(),
            version_placeholders: Vec::new(),
            steps: BuildSteps::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePatch {
    pub file: PathBuf,
    pub key: String,
    pub value: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacePatch {
    pub file: PathBuf,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderPatch {
    pub file: PathBuf,
    pub token: String,
    #[serde(default)]
    pub required: bool,
}

/// Shell commands for the four toolchain operations, run in the library
/// checkout. `locate_output` must print the generated docs directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSteps {
    pub assemble: String,
    pub api_docs: String,
    pub validate: String,
    pub locate_output: String,
}

impl Default for BuildSteps {
    fn default() -> Self {
        Self {
            assemble: "./gradlew assemble".to_owned(),
            api_docs: "./gradlew dokka".to_owned(),
            validate: "./gradlew runAnk".to_owned(),
            locate_output: "find . -type d -path '*/build/site' -prune -print | sort | head -n 1"
                .to_owned(),
        }
    }
}

/// Static site layout and generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Generator source tree.
    pub source_dir: PathBuf,
    /// Generator destination; removed before every build.
    pub output_dir: PathBuf,
    /// Where every library's generated docs are aggregated. Emptied at the
    /// start of each version.
    pub docs_dir: PathBuf,
    /// Pages (relative to `source_dir`) removed before generation.
    pub override_pages: Vec<PathBuf>,
    /// Holds one sub-directory of sidebar data per short version.
    pub sidebar_root: Option<PathBuf>,
    /// Generator data directory receiving the version's sidebar files.
    pub data_dir: PathBuf,
    /// Value for `JEKYLL_ENV`.
    pub environment: String,
    /// Generator command prefix, e.g. `["bundle", "exec", "jekyll", "build"]`.
    pub generator: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("site"),
            output_dir: PathBuf::from("site/_site"),
            docs_dir: PathBuf::from("site/docs"),
            override_pages: vec![PathBuf::from("docs/index.md")],
            sidebar_root: Some(PathBuf::from("site/sidebar")),
            data_dir: PathBuf::from("site/_data"),
            environment: "production".to_owned(),
            generator: ["bundle", "exec", "jekyll", "build"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Remote destination and routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    pub bucket: String,
    pub distribution_id: String,
    /// Optional key prefix under which versioned docs are published.
    #[serde(default)]
    pub s3_prefix: Option<String>,
    #[serde(default)]
    pub mode: PublishMode,
    /// Top-level output names published to the bucket root.
    #[serde(default = "default_main_content")]
    pub main_content: Vec<String>,
}

pub fn default_main_content() -> Vec<String> {
    [
        "index.html",
        "404.html",
        "css",
        "js",
        "img",
        "fonts",
        "favicon.ico",
        "robots.txt",
        "sitemap.xml",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

fn default_true() -> bool {
    true
}
