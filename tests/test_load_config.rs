use content_translator::load_config::{load_config, DATA_ENV, ROOT_ENV};
use content_translator_core::config::{CommandSpec, MaterializerConfig};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(ROOT_ENV);
    env::remove_var(DATA_ENV);
}

fn yaml_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), contents).unwrap();
    file
}

/// No file and no environment yields the built-in defaults.
#[test]
#[serial]
fn test_load_config_defaults() {
    clear_env();
    let config = load_config(None).expect("Defaults should load");

    assert_eq!(config.project_root, PathBuf::from("."));
    assert_eq!(config.data_dir, PathBuf::from("./data"));
    assert_eq!(config.source_language, "pt");
    assert_eq!(config.derived_language, "en");
    assert_eq!(config.materializer, MaterializerConfig::Copy);
}

/// Every YAML key is honoured, and a relative data dir hangs off the project root.
#[test]
#[serial]
fn test_load_config_from_yaml() {
    clear_env();
    let file = yaml_file(
        r#"
project_root: /srv/site
data_dir: content
languages:
  source: pt
  derived: es
materializer:
  type: command
  program: ./scripts/build-events.sh
  args: ["--quiet"]
"#,
    );

    let config = load_config(Some(file.path())).expect("Config should load");
    assert_eq!(config.project_root, PathBuf::from("/srv/site"));
    assert_eq!(config.data_dir, PathBuf::from("/srv/site/content"));
    assert_eq!(config.derived_language, "es");
    assert_eq!(
        config.materializer,
        MaterializerConfig::Command(CommandSpec {
            program: PathBuf::from("./scripts/build-events.sh"),
            args: vec!["--quiet".to_string()],
        })
    );
}

/// Environment variables take precedence over the YAML file.
#[test]
#[serial]
fn test_env_overrides_yaml() {
    clear_env();
    let file = yaml_file("project_root: /srv/site\ndata_dir: /srv/site/data\n");
    env::set_var(ROOT_ENV, "/tmp/override");
    env::set_var(DATA_ENV, "records");

    let config = load_config(Some(file.path())).expect("Config should load");
    clear_env();

    assert_eq!(config.project_root, PathBuf::from("/tmp/override"));
    assert_eq!(config.data_dir, PathBuf::from("/tmp/override/records"));
}

/// An empty file is the same as no file.
#[test]
#[serial]
fn test_empty_file_means_defaults() {
    clear_env();
    let file = yaml_file("\n");
    let config = load_config(Some(file.path())).expect("Empty config should load");
    assert_eq!(config.data_dir, PathBuf::from("./data"));
}

/// Invalid YAML, unknown keys and bad language pairs are all rejected.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    clear_env();

    let file = yaml_file("project_root: [unterminated\n");
    let err = load_config(Some(file.path())).expect_err("Invalid YAML must fail");
    assert!(
        err.to_string().contains("Failed to parse config YAML"),
        "unexpected error: {err}"
    );

    let file = yaml_file("output_dir: ./tmp\n");
    assert!(load_config(Some(file.path())).is_err(), "unknown key must fail");

    let file = yaml_file("languages:\n  source: en\n  derived: en\n");
    let err = load_config(Some(file.path())).expect_err("same language twice must fail");
    assert!(err.to_string().contains("Invalid configuration"), "{err}");

    let err = load_config(Some(Path::new("/definitely/missing.yaml")))
        .expect_err("missing file must fail");
    assert!(err.to_string().contains("Failed to read config file"), "{err}");
}
