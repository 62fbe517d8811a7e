//! A single execution environment.
//!
//! [`Environment`] pairs a container with the runtime that owns it and the
//! per-command timeout. Pipeline stages only ever see this type.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::error::Result;
use crate::runtime::ContainerId;
use crate::runtime::ContainerRuntime;
use crate::runtime::ContainerSpec;
use crate::runtime::EntryKind;
use crate::runtime::ExecOutcome;
use crate::runtime::ExecRequest;
use crate::runtime::ExitPolicy;

/// A running container.
///
/// Call [`Environment::destroy`] on every path; dropping does not remove the
/// container.
pub struct Environment {
    runtime: Arc<dyn ContainerRuntime>,
    id: ContainerId,
    image: String,
    exec_timeout: Option<Duration>,
}

impl Environment {
    /// Start a container from `spec`.
    pub async fn start(runtime: Arc<dyn ContainerRuntime>, spec: &ContainerSpec, exec_timeout: Option<Duration>) -> Result<Self> {
        let id = runtime.create(spec).await?;
        Ok(Self {
            runtime,
            id,
            image: spec.image.clone(),
            exec_timeout,
        })
    }

    /// Container ID.
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Image the container was started from.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Copy a host file or directory into the container.
    pub async fn copy_in(&self, host_path: &Path, container_path: &str) -> Result<()> {
        debug!(container = %self.id, host = %host_path.display(), path = container_path, "copy in");
        self.runtime.copy_in(&self.id, host_path, container_path).await
    }

    /// Run a command.
    pub async fn exec(&self, argv: Vec<String>, expect: ExitPolicy) -> Result<ExecOutcome> {
        let request = ExecRequest {
            argv,
            expect,
            timeout: self.exec_timeout,
        };
        self.runtime.exec(&self.id, &request).await
    }

    /// Export a single file to the host.
    pub async fn export_file(&self, container_path: &str, host_path: &Path) -> Result<()> {
        self.runtime.copy_out(&self.id, container_path, host_path, EntryKind::File).await
    }

    /// Export a directory's contents to the host.
    pub async fn export_directory(&self, container_path: &str, host_path: &Path) -> Result<()> {
        self.runtime.copy_out(&self.id, container_path, host_path, EntryKind::Directory).await
    }

    /// Remove the container.
    pub async fn destroy(self) -> Result<()> {
        let result = self.runtime.remove(&self.id).await;
        if let Err(ref e) = result {
            warn!(container = %self.id, error = %e, "failed to remove container");
        }
        result
    }
}

/// Combine a stage result with the result of the cleanup that followed it.
///
/// The stage error wins; a cleanup error is only returned when the stage
/// itself succeeded.
pub(crate) fn with_cleanup<T>(result: Result<T>, cleanup: Result<()>) -> Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            warn!(error = %cleanup_err, "cleanup failed after an earlier error");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;
    use crate::runtime::InMemoryRuntime;

    #[tokio::test]
    async fn test_start_exec_destroy() {
        let runtime = Arc::new(InMemoryRuntime::new());
        let spec = ContainerSpec {
            image: "unityci/editor:ubuntu-2022.3.1f1-webgl-3.1.0".into(),
            ..Default::default()
        };

        let env = Environment::start(runtime.clone(), &spec, None).await.unwrap();
        assert_eq!(env.image(), spec.image);

        let outcome = env.exec(vec!["true".into()], ExitPolicy::Success).await.unwrap();
        assert!(outcome.is_success());

        env.destroy().await.unwrap();
        assert_eq!(runtime.live_containers().await, 0);
    }

    #[test]
    fn test_with_cleanup_prefers_stage_error() {
        let stage: Result<()> = Err(ExecutorError::ContainerNotFound { id: "stage".into() });
        let cleanup: Result<()> = Err(ExecutorError::ContainerNotFound { id: "cleanup".into() });
        let err = with_cleanup(stage, cleanup).unwrap_err();
        assert!(err.to_string().contains("stage"));

        let err = with_cleanup(Ok(1), Err(ExecutorError::ContainerNotFound { id: "cleanup".into() })).unwrap_err();
        assert!(err.to_string().contains("cleanup"));

        assert_eq!(with_cleanup(Ok(1), Ok(())).unwrap(), 1);
    }
}
