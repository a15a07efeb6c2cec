/// `load_config` module: resolves the [`PipelineConfig`] the CLI runs with.
///
/// Sources, lowest precedence first:
/// 1. built-in defaults (project root `.`, data dir `<root>/data`, `pt` → `en`)
/// 2. an optional YAML file passed with `--config`
/// 3. the `CONTENT_TRANSLATOR_ROOT` / `CONTENT_TRANSLATOR_DATA` environment variables
///
/// A relative data dir is resolved against the project root.
///
/// # Accepted YAML
/// ```yaml
/// project_root: .
/// data_dir: data
/// languages:
///   source: pt
///   derived: en
/// materializer:
///   type: command          # or `copy` (default)
///   program: ./scripts/build-events.sh
///   args: ["--quiet"]
/// ```
///
/// # Errors
/// All errors use `anyhow::Error` and name the offending file or value.
use anyhow::Result;
use content_translator_core::config::{MaterializerConfig, PipelineConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ROOT_ENV: &str = "CONTENT_TRANSLATOR_ROOT";
pub const DATA_ENV: &str = "CONTENT_TRANSLATOR_DATA";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    project_root: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    #[serde(default)]
    languages: LanguagesSection,
    #[serde(default)]
    materializer: MaterializerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanguagesSection {
    source: Option<String>,
    derived: Option<String>,
}

/// Loads the configuration, reading `path` when given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let raw = match path {
        Some(path) => read_yaml(path)?,
        None => RawConfig::default(),
    };

    let project_root = env_path(ROOT_ENV)
        .or(raw.project_root)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = PipelineConfig::new(&project_root);

    if let Some(data_dir) = env_path(DATA_ENV).or(raw.data_dir) {
        config.data_dir = if data_dir.is_absolute() {
            data_dir
        } else {
            project_root.join(data_dir)
        };
    }
    if let Some(source) = raw.languages.source {
        config.source_language = source;
    }
    if let Some(derived) = raw.languages.derived {
        config.derived_language = derived;
    }
    config.materializer = raw.materializer;

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration rejected");
        return Err(anyhow::anyhow!("Invalid configuration: {e}"));
    }
    info!(
        project_root = %config.project_root.display(),
        data_dir = %config.data_dir.display(),
        "Configuration resolved"
    );
    Ok(config)
}

fn read_yaml(path: &Path) -> Result<RawConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(raw) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(raw)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path))
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
