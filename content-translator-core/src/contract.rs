//! # contract: the injected build step
//!
//! Before any record is loaded, an operation asks a [`Materializer`] to produce
//! a temporary workspace holding the loadable record tree:
//!
//! ```text
//! <workspace>/events/              shared.<src>.json, event_<slug>.<src>.json
//! <workspace>/events/generated/    shared.<dst>.json, event_<slug>.<dst>.json
//! ```
//!
//! The workspace is a [`tempfile::TempDir`], so it is removed whenever the
//! [`MaterializedWorkspace`] is dropped, on success and failure alike.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; tests use `MockMaterializer` to
//!   inject failures or hand-built workspaces without spawning processes.

use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::config::{EVENTS_DIR, GENERATED_DIR};

/// What a materializer is asked to build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
}

/// A scoped build workspace. Dropping it deletes the directory tree.
#[derive(Debug)]
pub struct MaterializedWorkspace {
    dir: TempDir,
}

impl MaterializedWorkspace {
    /// Creates an empty workspace under the system temp dir.
    pub fn create() -> Result<Self, MaterializeError> {
        let dir = tempfile::Builder::new()
            .prefix("events-build-")
            .tempdir()
            .map_err(MaterializeError::Workspace)?;
        Ok(Self { dir })
    }

    pub fn from_dir(dir: TempDir) -> Self {
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory holding the source-language records.
    pub fn events_dir(&self) -> PathBuf {
        self.root().join(EVENTS_DIR)
    }

    /// Directory holding the derived-language records.
    pub fn generated_dir(&self) -> PathBuf {
        self.events_dir().join(GENERATED_DIR)
    }
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The build ran but reported failure; carries its diagnostics verbatim.
    #[error("{0}")]
    Failed(String),

    /// The build could not be invoked at all.
    #[error("could not invoke materializer: {0}")]
    Transport(#[source] std::io::Error),

    /// The temporary workspace could not be prepared.
    #[error("could not prepare build workspace: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Produces the record tree an operation loads from.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(
        &self,
        request: &BuildRequest,
    ) -> Result<MaterializedWorkspace, MaterializeError>;
}
