//! Error types for gameci execution.
//!
//! Errors preserve source chains. Command lines embedded in errors are
//! always redacted first.

use std::path::PathBuf;

use gameci_core::CoreError;
use snafu::Snafu;

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors raised while preparing, running, or tearing down a run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecutorError {
    /// Input resolution failed (version, license, secret, settings).
    #[snafu(context(false))]
    #[snafu(display("{source}"))]
    Core {
        /// Underlying core error.
        source: CoreError,
    },

    // ========================================================================
    // Workspace Errors
    // ========================================================================
    /// The project directory does not exist or is not a directory.
    #[snafu(display("Project directory not found: {}", path.display()))]
    ProjectNotFound {
        /// Path that was given.
        path: PathBuf,
    },

    /// A host input file does not exist.
    #[snafu(display("{what} not found: {}", path.display()))]
    HostFileNotFound {
        /// Which input this is.
        what: &'static str,
        /// Path that was given.
        path: PathBuf,
    },

    /// Failed to stage the filtered project tree.
    #[snafu(display("Failed to stage workspace entry {}: {source}", path.display()))]
    StageWorkspace {
        /// Entry that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The project tree nests deeper than the staging limit.
    #[snafu(display("Project tree exceeds maximum depth {max_depth} at {}", path.display()))]
    WorkspaceTooDeep {
        /// Entry that crossed the limit.
        path: PathBuf,
        /// Depth limit.
        max_depth: u32,
    },

    /// Failed to create a scratch directory.
    #[snafu(display("Failed to create scratch directory: {source}"))]
    CreateScratch {
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Background staging task panicked or was cancelled.
    #[snafu(display("Workspace staging task failed: {source}"))]
    StagingTask {
        /// Join error.
        source: tokio::task::JoinError,
    },

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// The container CLI could not be spawned.
    #[snafu(display("Failed to spawn container CLI '{binary}': {source}"))]
    SpawnRuntime {
        /// Binary that was spawned.
        binary: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A container CLI management call exited non-zero.
    #[snafu(display("Container operation '{operation}' failed with exit code {exit_code}: {stderr}"))]
    RuntimeCommand {
        /// Operation name (run, cp, rm, ...).
        operation: String,
        /// Exit code of the CLI.
        exit_code: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// Unknown container ID.
    #[snafu(display("Container not found: {id}"))]
    ContainerNotFound {
        /// Container ID.
        id: String,
    },

    /// Path requested from a container does not exist.
    #[snafu(display("Path {path} not found in container {id}"))]
    ContainerPathNotFound {
        /// Container ID.
        id: String,
        /// Path inside the container.
        path: String,
    },

    /// A command required to succeed exited non-zero.
    #[snafu(display("Command `{command}` in {id} exited with code {exit_code}: {stderr_tail}"))]
    ExecFailed {
        /// Container ID.
        id: String,
        /// Redacted command line.
        command: String,
        /// Exit code.
        exit_code: i32,
        /// Tail of stderr.
        stderr_tail: String,
    },

    /// A command exceeded the configured timeout.
    #[snafu(display("Command `{command}` timed out after {timeout_secs} seconds"))]
    ExecTimeout {
        /// Redacted command line.
        command: String,
        /// Timeout in seconds.
        timeout_secs: u64,
    },

    /// Failed to write exported files on the host.
    #[snafu(display("Failed to export to {}: {source}", path.display()))]
    Export {
        /// Host destination.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    // ========================================================================
    // Pipeline Errors
    // ========================================================================
    /// The editor's build or test command exited non-zero under the strict
    /// error policy.
    #[snafu(display("Editor {mode} command exited with code {exit_code}\n\nstderr:\n{stderr_tail}\n\nstdout:\n{stdout_tail}"))]
    ToolFailed {
        /// `build` or `test`.
        mode: &'static str,
        /// Exit code of the editor.
        exit_code: i32,
        /// Tail of stderr.
        stderr_tail: String,
        /// Tail of stdout.
        stdout_tail: String,
    },
}
