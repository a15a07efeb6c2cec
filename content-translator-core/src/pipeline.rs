//! High-level operations: export → apply → build.
//!
//! Each operation is independent and runs the same fixed sequence:
//! materialize the record tree into a scoped workspace, load, validate or
//! merge, then respond. The workspace is dropped (and deleted) before any
//! result is persisted, and nothing is persisted unless every check passed.
//!
//! # Operations
//! - [`export_for_translation`]: source bundle plus reply instructions
//! - [`apply_translation`]: validate a payload and regenerate derived records
//! - [`build_final_dataset`]: merge both languages into the final JSON
//!
//! # Error Handling
//! Every failure is fatal to the current operation and returned as a
//! [`PipelineError`]; callers re-issue the whole operation.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::contract::{BuildRequest, MaterializedWorkspace, Materializer};
use crate::error::{PipelineError, Result};
use crate::loader::{load_bundle, Bundle};
use crate::merge::{merge_bundles, MergedBundle};
use crate::normalize::prune_shared_sections;
use crate::payload::parse_payload;
use crate::render::{render_derived, write_records};

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub instructions: String,
    pub dataset: Bundle,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutput {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub message: String,
    pub data: MergedBundle,
    pub path: PathBuf,
}

/// How the translated reply must be shaped.
pub fn translation_instructions(config: &PipelineConfig) -> String {
    let source = &config.source_language;
    let derived = &config.derived_language;
    [
        format!("Translate every `{source}` string in the dataset to `{derived}`."),
        "Return JSON with the structure { shared: {...}, events: [...] } matching the dataset: \
         shared holds schedules (keyed exactly as in the dataset), intro, howItWorks and plans; \
         each events entry holds slug, translations and, only when the event overrides the shared \
         content, sections."
            .to_string(),
        format!(
            "Do not nest language keys ({source} or {derived}) inside the payload; every text field \
             must already contain the translated string, and schedule period labels are plain strings."
        ),
        "Keep ids, slugs, dates, schedule keys, timezones, period start/end times and plan button \
         tokens unchanged."
            .to_string(),
    ]
    .join(" ")
}

fn build_request(config: &PipelineConfig) -> BuildRequest {
    BuildRequest {
        project_root: config.project_root.clone(),
        data_dir: config.data_dir.clone(),
    }
}

async fn materialize<M>(config: &PipelineConfig, materializer: &M) -> Result<MaterializedWorkspace>
where
    M: Materializer + ?Sized,
{
    config.validate()?;
    materializer
        .materialize(&build_request(config))
        .await
        .map_err(|e| {
            error!(error = %e, "[PIPELINE][ERROR] Materialization failed");
            PipelineError::from(e)
        })
}

/// Reads the source bundle and pairs it with the reply instructions.
pub async fn export_for_translation<M>(
    config: &PipelineConfig,
    materializer: &M,
) -> Result<ExportOutput>
where
    M: Materializer + ?Sized,
{
    info!("[EXPORT] Loading source dataset for translation");
    let workspace = materialize(config, materializer).await?;
    let dataset = load_bundle(&workspace.events_dir(), &config.source_language)?;
    info!(events = dataset.events.len(), "[EXPORT] Source dataset ready");
    Ok(ExportOutput {
        instructions: translation_instructions(config),
        dataset,
    })
}

/// Validates `payload`, prunes redundant overrides and replaces the derived
/// record directory with freshly rendered records.
pub async fn apply_translation<M>(
    config: &PipelineConfig,
    materializer: &M,
    payload: &str,
) -> Result<ApplyOutput>
where
    M: Materializer + ?Sized,
{
    info!(bytes = payload.len(), "[APPLY] Applying translation payload");
    let mut translation = parse_payload(payload)?;
    let pruned = prune_shared_sections(&mut translation);
    info!(pruned, events = translation.events.len(), "[APPLY] Payload normalized");

    let workspace = materialize(config, materializer).await?;
    let source = load_bundle(&workspace.events_dir(), &config.source_language)?;
    let files = render_derived(&source, &translation, &config.derived_language)?;
    drop(workspace);

    let generated = config.generated_dir();
    write_records(&generated, &files)?;
    info!(files = files.len(), path = %generated.display(), "[APPLY] Derived records regenerated");
    Ok(ApplyOutput {
        message: format!(
            "Derived `{}` records regenerated in {}.",
            config.derived_language,
            generated.display()
        ),
    })
}

/// Merges source and derived bundles and writes the result to `output`
/// (default: `<data>/events/generated/events.json`).
pub async fn build_final_dataset<M>(
    config: &PipelineConfig,
    materializer: &M,
    output: Option<&Path>,
) -> Result<BuildOutput>
where
    M: Materializer + ?Sized,
{
    let path = config.resolve_output_path(output);
    info!(output = %path.display(), "[BUILD] Building final dataset");

    let workspace = materialize(config, materializer).await?;
    let source = load_bundle(&workspace.events_dir(), &config.source_language)?;
    let derived = load_bundle(&workspace.generated_dir(), &config.derived_language)?;
    let merged = merge_bundles(&source, &derived)?;
    drop(workspace);

    write_merged(&path, &merged)?;
    info!(events = merged.events.len(), output = %path.display(), "[BUILD] Final dataset written");
    Ok(BuildOutput {
        message: format!("Final JSON written to {}", path.display()),
        data: merged,
        path,
    })
}

fn write_merged(path: &Path, merged: &MergedBundle) -> Result<()> {
    let mut contents = serde_json::to_string_pretty(merged).map_err(|e| PipelineError::Encode {
        what: "merged dataset".to_string(),
        source: e,
    })?;
    contents.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| {
        error!(error = ?e, path = %path.display(), "[BUILD][ERROR] Failed to write final dataset");
        PipelineError::io(path, e)
    })
}
