//! Artifact export.

use std::path::Path;
use std::path::PathBuf;

use gameci_core::RunMode;
use serde::Serialize;
use tracing::info;

use crate::environment::Environment;
use crate::error::Result;

/// The exported output directory of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDirectory {
    /// Directory inside the environment (`/builds` or `/results`).
    pub container_path: String,
    /// Where its contents were written on the host.
    pub host_path: PathBuf,
}

/// Copy the mode's output directory to `output_dir`.
pub(crate) async fn export_artifacts(env: &Environment, mode: &RunMode, output_dir: &Path) -> Result<ArtifactDirectory> {
    let container_path = mode.artifact_path();
    env.export_directory(container_path, output_dir).await?;
    info!(path = container_path, host = %output_dir.display(), "artifacts exported");

    Ok(ArtifactDirectory {
        container_path: container_path.to_string(),
        host_path: output_dir.to_path_buf(),
    })
}
