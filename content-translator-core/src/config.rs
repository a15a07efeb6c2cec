use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Directory (under the data dir) holding the source-language records.
pub const EVENTS_DIR: &str = "events";
/// Directory (under [`EVENTS_DIR`]) holding the derived-language records.
pub const GENERATED_DIR: &str = "generated";
/// File name of the merged artifact inside the generated directory.
pub const MERGED_FILE: &str = "events.json";

pub const DEFAULT_SOURCE_LANGUAGE: &str = "pt";
pub const DEFAULT_DERIVED_LANGUAGE: &str = "en";

/// Resolved pipeline configuration: where the data lives and which
/// languages play which role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub source_language: String,
    pub derived_language: String,
    #[serde(default)]
    pub materializer: MaterializerConfig,
}

/// Selects how the record tree is materialized before loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterializerConfig {
    /// Copy the plain JSON records into the workspace.
    #[default]
    Copy,
    /// Run an external program that writes the records into the workspace.
    Command(CommandSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl PipelineConfig {
    /// Configuration rooted at `project_root` with every other value defaulted.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            data_dir: project_root.join("data"),
            project_root,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            derived_language: DEFAULT_DERIVED_LANGUAGE.to_string(),
            materializer: MaterializerConfig::Copy,
        }
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir.join(EVENTS_DIR)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.events_dir().join(GENERATED_DIR)
    }

    pub fn default_output_path(&self) -> PathBuf {
        self.generated_dir().join(MERGED_FILE)
    }

    /// Where the merged artifact goes; relative paths hang off the project root.
    pub fn resolve_output_path(&self, output: Option<&Path>) -> PathBuf {
        match output {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.project_root.join(path),
            None => self.default_output_path(),
        }
    }

    /// Rejects language tags the file naming convention cannot carry.
    pub fn validate(&self) -> Result<()> {
        for (role, tag) in [
            ("source", &self.source_language),
            ("derived", &self.derived_language),
        ] {
            if !is_language_tag(tag) {
                return Err(PipelineError::Config(format!(
                    "{role} language `{tag}` is not a valid language tag"
                )));
            }
        }
        if self.source_language == self.derived_language {
            return Err(PipelineError::Config(format!(
                "source and derived language are both `{}`",
                self.source_language
            )));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            project_root = %self.project_root.display(),
            data_dir = %self.data_dir.display(),
            source_language = %self.source_language,
            derived_language = %self.derived_language,
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

fn is_language_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}
