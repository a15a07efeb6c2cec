//! Concrete [`Materializer`]s.
//!
//! - [`CopyMaterializer`] snapshots the plain JSON records into the workspace.
//! - [`CommandMaterializer`] delegates to an external build program and
//!   surfaces its diagnostics when it fails.

use std::fs;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, error, info};

use crate::config::{CommandSpec, MaterializerConfig, EVENTS_DIR, GENERATED_DIR};
use crate::contract::{BuildRequest, MaterializeError, MaterializedWorkspace, Materializer};

/// Copies `<data>/events/*.json` and `<data>/events/generated/*.json` into a
/// fresh workspace. No code is executed.
#[derive(Debug, Clone, Default)]
pub struct CopyMaterializer;

impl CopyMaterializer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Materializer for CopyMaterializer {
    async fn materialize(
        &self,
        request: &BuildRequest,
    ) -> Result<MaterializedWorkspace, MaterializeError> {
        let workspace = MaterializedWorkspace::create()?;
        let events = request.data_dir.join(EVENTS_DIR);
        let copied = copy_records(&events, &workspace.events_dir())?
            + copy_records(&events.join(GENERATED_DIR), &workspace.generated_dir())?;
        info!(
            data_dir = %request.data_dir.display(),
            workspace = %workspace.root().display(),
            files = copied,
            "Materialized record tree"
        );
        Ok(workspace)
    }
}

/// Copies the `*.json` files directly inside `from` into `to`. A missing
/// `from` yields an empty `to`.
fn copy_records(from: &Path, to: &Path) -> Result<usize, MaterializeError> {
    fs::create_dir_all(to).map_err(MaterializeError::Workspace)?;
    if !from.is_dir() {
        debug!(path = %from.display(), "Record directory absent, nothing to copy");
        return Ok(0);
    }

    let mut copied = 0;
    for entry in fs::read_dir(from).map_err(MaterializeError::Workspace)? {
        let path = entry.map_err(MaterializeError::Workspace)?.path();
        let is_record = path.is_file() && path.extension().is_some_and(|ext| ext == "json");
        if !is_record {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, to.join(name)).map_err(|e| {
                error!(error = ?e, path = %path.display(), "Failed to copy record into workspace");
                MaterializeError::Workspace(e)
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Runs an external build program that writes the record tree into the
/// workspace named by `CONTENT_TRANSLATOR_OUT_DIR`.
///
/// The child is killed if the returned future is dropped before it finishes.
#[derive(Debug, Clone)]
pub struct CommandMaterializer {
    spec: CommandSpec,
}

impl CommandMaterializer {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait::async_trait]
impl Materializer for CommandMaterializer {
    async fn materialize(
        &self,
        request: &BuildRequest,
    ) -> Result<MaterializedWorkspace, MaterializeError> {
        let workspace = MaterializedWorkspace::create()?;
        info!(
            program = %self.spec.program.display(),
            args = ?self.spec.args,
            workspace = %workspace.root().display(),
            "Running materializer command"
        );

        let output = tokio::process::Command::new(&self.spec.program)
            .args(&self.spec.args)
            .current_dir(&request.project_root)
            .env("CONTENT_TRANSLATOR_ROOT", &request.project_root)
            .env("CONTENT_TRANSLATOR_DATA", &request.data_dir)
            .env("CONTENT_TRANSLATOR_OUT_DIR", workspace.root())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                error!(error = ?e, program = %self.spec.program.display(), "Failed to launch materializer");
                MaterializeError::Transport(e)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("materializer exited with {}", output.status));
            error!(status = %output.status, message = %message, "Materializer reported failure");
            return Err(MaterializeError::Failed(message));
        }

        debug!(status = %output.status, "Materializer finished");
        Ok(workspace)
    }
}

/// The materializer selected by configuration.
pub fn materializer_from_config(config: &MaterializerConfig) -> Box<dyn Materializer> {
    match config {
        MaterializerConfig::Copy => Box::new(CopyMaterializer::new()),
        MaterializerConfig::Command(spec) => Box::new(CommandMaterializer::new(spec.clone())),
    }
}
