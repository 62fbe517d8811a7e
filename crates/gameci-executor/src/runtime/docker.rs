//! Docker-compatible CLI runtime.
//!
//! Containers are started detached with `sleep infinity` as their entrypoint
//! and every pipeline command is a `docker exec`. Command output is streamed
//! line by line into the log and the tail is kept for the outcome.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use gameci_core::verified::redact_args;
use snafu::ResultExt;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Command;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ContainerId;
use super::ContainerRuntime;
use super::ContainerSpec;
use super::EntryKind;
use super::ExecOutcome;
use super::ExecRequest;
use super::ExitPolicy;
use super::OUTPUT_TAIL_BYTES;
use super::push_tail;
use crate::error::ExecFailedSnafu;
use crate::error::ExecutorError;
use crate::error::ExportSnafu;
use crate::error::Result;
use crate::error::SpawnRuntimeSnafu;

/// Maximum line length for streamed output (64 KB).
/// Lines longer than this are truncated.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Runtime backed by the `docker` CLI or a compatible binary.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    /// CLI binary (`docker`, `podman`, ...).
    binary: String,
}

impl DockerRuntime {
    /// Create a runtime that invokes `binary`.
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Run a management command and return its trimmed stdout.
    async fn cli(&self, operation: &str, args: &[String]) -> Result<String> {
        debug!(binary = %self.binary, operation, args = ?args, "container cli");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context(SpawnRuntimeSnafu {
                binary: self.binary.clone(),
            })?;

        if !output.status.success() {
            return Err(ExecutorError::RuntimeCommand {
                operation: operation.to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn mkdir(&self, id: &ContainerId, path: &str) -> Result<()> {
        self.cli("mkdir", &["exec".into(), id.0.clone(), "mkdir".into(), "-p".into(), path.into()]).await?;
        Ok(())
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new(gameci_core::constants::DEFAULT_CONTAINER_BINARY)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let mut args = vec![
            "run".to_string(),
            "--detach".to_string(),
            "--init".to_string(),
            "--entrypoint".to_string(),
            "sleep".to_string(),
        ];
        for (key, value) in &spec.env {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        for mount in &spec.cache_mounts {
            args.push("--volume".to_string());
            args.push(format!("{}:{}", mount.volume, mount.target));
        }
        args.push(spec.image.clone());
        args.push("infinity".to_string());

        let id = ContainerId(self.cli("run", &args).await?);
        info!(image = %spec.image, container = %id, "container started");
        Ok(id)
    }

    async fn copy_in(&self, id: &ContainerId, host_path: &Path, container_path: &str) -> Result<()> {
        let is_dir = tokio::fs::metadata(host_path).await.map(|m| m.is_dir()).unwrap_or(false);

        let source = if is_dir {
            self.mkdir(id, container_path).await?;
            // Trailing `/.` copies the contents rather than the directory itself.
            format!("{}/.", host_path.display())
        } else {
            if let Some((parent, _)) = container_path.rsplit_once('/')
                && !parent.is_empty()
            {
                self.mkdir(id, parent).await?;
            }
            host_path.display().to_string()
        };

        self.cli("cp", &["cp".into(), source, format!("{id}:{container_path}")]).await?;
        debug!(container = %id, host = %host_path.display(), path = container_path, "copied into container");
        Ok(())
    }

    async fn exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecOutcome> {
        let start = Instant::now();
        let command = redact_args(&request.argv).join(" ");
        info!(container = %id, command = %command, "executing command");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("exec")
            .arg(&id.0)
            .args(&request.argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().context(SpawnRuntimeSnafu {
            binary: self.binary.clone(),
        })?;

        let stdout_handle = child.stdout.take().map(|s| tokio::spawn(stream_lines(s, "stdout")));
        let stderr_handle = child.stderr.take().map(|s| tokio::spawn(stream_lines(s, "stderr")));

        let status = match request.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(container = %id, timeout_secs = timeout.as_secs(), "execution timed out");
                    // Killing the CLI client does not stop the process inside the
                    // container; the container itself is removed at run end.
                    let _ = child.kill().await;
                    return Err(ExecutorError::ExecTimeout {
                        command,
                        timeout_secs: timeout.as_secs(),
                    });
                }
            },
            None => child.wait().await,
        }
        .context(SpawnRuntimeSnafu {
            binary: self.binary.clone(),
        })?;

        let stdout = match stdout_handle {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr = match stderr_handle {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        let outcome = ExecOutcome {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            container = %id,
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration_ms,
            "command finished"
        );

        if request.expect == ExitPolicy::Success && !outcome.is_success() {
            return ExecFailedSnafu {
                id: id.0.clone(),
                command,
                exit_code: outcome.exit_code,
                stderr_tail: outcome.stderr,
            }
            .fail();
        }

        Ok(outcome)
    }

    async fn copy_out(&self, id: &ContainerId, container_path: &str, host_path: &Path, kind: EntryKind) -> Result<()> {
        let (source, parent) = match kind {
            EntryKind::Directory => (format!("{id}:{}/.", container_path.trim_end_matches('/')), Some(host_path)),
            EntryKind::File => (format!("{id}:{container_path}"), host_path.parent()),
        };

        if let Some(parent) = parent
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.context(ExportSnafu { path: parent })?;
        }

        self.cli("cp", &["cp".into(), source, host_path.display().to_string()]).await?;
        debug!(container = %id, path = container_path, host = %host_path.display(), "copied out of container");
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        self.cli("rm", &["rm".into(), "--force".into(), id.0.clone()]).await?;
        info!(container = %id, "container removed");
        Ok(())
    }
}

/// Read a stream line by line, logging each line and keeping the tail.
///
/// Lines are decoded lossily. The stream is always read to EOF so the writer
/// never sees a closed pipe.
async fn stream_lines<R: AsyncRead + Unpin>(stream: R, name: &'static str) -> String {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut collected = String::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let truncated = buf.len() > MAX_LINE_LENGTH;
                buf.truncate(MAX_LINE_LENGTH);
                let mut line = String::from_utf8_lossy(&buf).into_owned();
                if truncated {
                    line.push_str("... [truncated]\n");
                }
                debug!(stream = name, "{}", line.trim_end());
                push_tail(&mut collected, &line, OUTPUT_TAIL_BYTES);
            }
            Err(e) => {
                warn!(stream = name, "error reading output: {}", e);
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    warn!(stream = name, "error draining output: {}", e);
                }
                break;
            }
        }
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binary() {
        assert_eq!(DockerRuntime::default().binary, "docker");
        assert_eq!(DockerRuntime::new("podman").binary, "podman");
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_LINE_LENGTH, 64 * 1024);
    }

    #[tokio::test]
    async fn test_missing_binary_reports_spawn_error() {
        let runtime = DockerRuntime::new("gameci-test-no-such-container-cli");
        let err = runtime.create(&ContainerSpec::default()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::SpawnRuntime { .. }));
        assert!(err.to_string().contains("gameci-test-no-such-container-cli"));
    }

    #[tokio::test]
    async fn test_stream_lines_collects_output() {
        let data: &[u8] = b"first\nsecond\n";
        let collected = stream_lines(data, "stdout").await;
        assert_eq!(collected, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_stream_lines_decodes_invalid_utf8() {
        let data: &[u8] = b"start\n\xff\xfebad\nend\n";
        let collected = stream_lines(data, "stdout").await;
        assert_eq!(collected, "start\n\u{FFFD}\u{FFFD}bad\nend\n");
    }

    #[tokio::test]
    async fn test_stream_lines_truncates_long_lines() {
        let data = vec![b'a'; MAX_LINE_LENGTH + 10];
        let collected = stream_lines(data.as_slice(), "stdout").await;
        assert!(collected.ends_with("a... [truncated]\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_survives_invalid_utf8_output() {
        use std::os::unix::fs::PermissionsExt;

        // Stands in for a container CLI whose exec'd tool prints binary noise.
        let dir = tempfile::TempDir::new().unwrap();
        let cli = dir.path().join("fake-cli");
        std::fs::write(
            &cli,
            "#!/bin/sh\nprintf 'start\\n\\377\\376bad\\n'\ni=0\nwhile [ $i -lt 20000 ]; do echo \"line $i\"; i=$((i+1)); done\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runtime = DockerRuntime::new(cli.to_str().unwrap());
        let request = ExecRequest {
            argv: vec!["unity-editor".into(), "-batchmode".into()],
            expect: ExitPolicy::Success,
            timeout: None,
        };
        let outcome = runtime.exec(&ContainerId("abc".into()), &request).await.unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.ends_with("line 19999\n"));
    }

    #[tokio::test]
    async fn test_failing_cli_reports_runtime_command_error() {
        // `false` exits 1 regardless of arguments, standing in for a failing CLI.
        let runtime = DockerRuntime::new("false");
        let err = runtime.remove(&ContainerId("abc".into())).await.unwrap_err();
        assert!(matches!(err, ExecutorError::RuntimeCommand { exit_code: 1, .. }));
    }
}
