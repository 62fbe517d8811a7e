//! Container runtime abstraction.
//!
//! The pipeline never talks to a container engine directly. It drives a
//! [`ContainerRuntime`], which has two implementations:
//!
//! - [`DockerRuntime`]: shells out to a Docker-compatible CLI
//! - [`InMemoryRuntime`]: records operations against a virtual filesystem,
//!   used for dry runs and tests

mod docker;
mod memory;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
pub use docker::DockerRuntime;
pub use memory::InMemoryRuntime;
pub use memory::RuntimeEvent;
use serde::Serialize;

use crate::error::Result;

/// Maximum bytes of stdout/stderr kept per command (64 KB).
///
/// The tail is kept since editor failures are reported at the end of the log.
pub const OUTPUT_TAIL_BYTES: usize = 64 * 1024;

/// Identifier of a running container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMount {
    /// Volume name.
    pub volume: String,
    /// Mount point inside the container.
    pub target: String,
}

/// What to start.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    /// Image reference.
    pub image: String,
    /// Environment variables.
    pub env: Vec<(String, String)>,
    /// Persistent cache volumes.
    pub cache_mounts: Vec<CacheMount>,
}

/// Whether a non-zero exit is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Any exit status is returned as an outcome.
    Any,
    /// A non-zero exit status is returned as `ExecFailed`.
    Success,
}

/// A command to run inside a container.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Program and arguments.
    pub argv: Vec<String>,
    /// How to treat the exit status.
    pub expect: ExitPolicy,
    /// Kill the command after this long.
    pub timeout: Option<Duration>,
}

/// Result of a command inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    /// Exit code (`-1` if the process was killed by a signal).
    pub exit_code: i32,
    /// Tail of stdout.
    pub stdout: String,
    /// Tail of stderr.
    pub stderr: String,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl ExecOutcome {
    /// Check if the command exited with status zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Kind of path being exported from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A single file.
    File,
    /// A directory, exported by contents.
    Directory,
}

/// Operations the pipeline needs from a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start a long-lived container that commands can be executed in.
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId>;

    /// Copy a host file or directory to `container_path`.
    ///
    /// For directories the contents land directly under `container_path`.
    /// Missing parent directories are created.
    async fn copy_in(&self, id: &ContainerId, host_path: &Path, container_path: &str) -> Result<()>;

    /// Run a command.
    async fn exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecOutcome>;

    /// Copy `container_path` to the host.
    ///
    /// For directories the contents land directly under `host_path`, which
    /// is created if needed.
    async fn copy_out(&self, id: &ContainerId, container_path: &str, host_path: &Path, kind: EntryKind) -> Result<()>;

    /// Stop and delete the container.
    async fn remove(&self, id: &ContainerId) -> Result<()>;
}

/// Append to a bounded buffer, keeping the tail.
pub(crate) fn push_tail(buffer: &mut String, chunk: &str, max: usize) -> bool {
    buffer.push_str(chunk);
    if buffer.len() <= max {
        return false;
    }
    let mut start = buffer.len() - max;
    while !buffer.is_char_boundary(start) {
        start += 1;
    }
    buffer.drain(..start);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_tail_keeps_end() {
        let mut buffer = String::new();
        assert!(!push_tail(&mut buffer, "hello ", 10));
        assert!(push_tail(&mut buffer, "world!", 10));
        assert_eq!(buffer, "llo world!");
    }

    #[test]
    fn test_push_tail_respects_char_boundaries() {
        let mut buffer = String::new();
        push_tail(&mut buffer, "ééééé", 3);
        assert!(buffer.len() <= 3);
        assert!(buffer.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_outcome_success() {
        let outcome = ExecOutcome {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 1,
        };
        assert!(outcome.is_success());
        assert!(!ExecOutcome { exit_code: 2, ..outcome }.is_success());
    }
}
