//! In-memory runtime for dry runs and tests.
//!
//! Containers are virtual filesystems keyed by absolute path. Commands never
//! run; the editor and converter commands leave behind the files they would
//! have produced (log file, results file, build directory, redirected shell
//! output) so that later stages have something to copy and export.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use gameci_core::verified::redact_args;
use serde::Serialize;
use snafu::OptionExt;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::info;

use super::CacheMount;
use super::ContainerId;
use super::ContainerRuntime;
use super::ContainerSpec;
use super::EntryKind;
use super::ExecOutcome;
use super::ExecRequest;
use super::ExitPolicy;
use crate::error::ContainerNotFoundSnafu;
use crate::error::ContainerPathNotFoundSnafu;
use crate::error::ExecFailedSnafu;
use crate::error::ExecutorError;
use crate::error::ExportSnafu;
use crate::error::Result;
use crate::error::StageWorkspaceSnafu;
use crate::error::StagingTaskSnafu;

/// A container operation, as recorded by [`InMemoryRuntime`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// A container was started.
    Create {
        /// Container ID.
        id: String,
        /// Image reference.
        image: String,
        /// Environment variable names.
        env: Vec<String>,
        /// Cache mounts as `volume:target`.
        cache_mounts: Vec<String>,
    },
    /// Host content was copied in.
    CopyIn {
        /// Container ID.
        id: String,
        /// Destination inside the container.
        container_path: String,
        /// Files copied, relative to the destination (empty for a single file).
        files: Vec<String>,
    },
    /// A command ran.
    Exec {
        /// Container ID.
        id: String,
        /// Redacted argument vector.
        argv: Vec<String>,
        /// Exit code returned.
        exit_code: i32,
    },
    /// Container content was copied to the host.
    CopyOut {
        /// Container ID.
        id: String,
        /// Source inside the container.
        container_path: String,
        /// Host destination.
        host_path: PathBuf,
    },
    /// A container was removed.
    Remove {
        /// Container ID.
        id: String,
    },
}

impl RuntimeEvent {
    /// Container the event belongs to.
    pub fn container(&self) -> &str {
        match self {
            RuntimeEvent::Create { id, .. }
            | RuntimeEvent::CopyIn { id, .. }
            | RuntimeEvent::Exec { id, .. }
            | RuntimeEvent::CopyOut { id, .. }
            | RuntimeEvent::Remove { id } => id,
        }
    }
}

/// Contents of a virtual file.
///
/// Files copied in as part of a directory keep a reference to the host file
/// instead of its bytes, so a dry run over a large project stays cheap. The
/// host file must outlive the container for a later export to see it.
#[derive(Debug, Clone)]
enum Contents {
    Inline(Vec<u8>),
    Host(PathBuf),
}

#[derive(Debug, Default)]
struct VirtualContainer {
    files: BTreeMap<String, Contents>,
    dirs: BTreeSet<String>,
}

impl VirtualContainer {
    fn add_dirs(&mut self, path: &str) {
        let mut current = path.trim_end_matches('/');
        while !current.is_empty() {
            self.dirs.insert(current.to_string());
            match current.rsplit_once('/') {
                Some((parent, _)) => current = parent,
                None => break,
            }
        }
    }

    fn write(&mut self, path: &str, contents: Contents) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_dirs(parent);
        }
        self.files.insert(path.to_string(), contents);
    }

    fn mkdir(&mut self, path: &str) {
        self.add_dirs(path);
    }

    fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path.trim_end_matches('/'))
    }

    /// Files below `dir`, relative to it.
    fn files_under(&self, dir: &str) -> Vec<(String, Contents)> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.files
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, contents)| (path[prefix.len()..].to_string(), contents.clone()))
            .collect()
    }

    /// Leave behind the files a command would have produced.
    fn simulate_outputs(&mut self, argv: &[String]) {
        for pair in argv.windows(2) {
            match pair[0].as_str() {
                "-logFile" => self.write(&pair[1], Contents::Inline(b"simulated editor log\n".to_vec())),
                "-testResults" => self.write(&pair[1], Contents::Inline(b"<test-run result=\"Passed\" />\n".to_vec())),
                "-customBuildPath" => self.mkdir(&pair[1]),
                _ => {}
            }
        }

        if let Some(path) = flag_value(argv, "-customBuildPath")
            && let Some(name) = flag_value(argv, "-customBuildName")
        {
            let player = format!("{}/{name}", path.trim_end_matches('/'));
            self.write(&player, Contents::Inline(b"simulated player\n".to_vec()));
        }

        if argv.first().map(String::as_str) == Some("sh")
            && let Some(script) = argv.get(2)
            && let Some((_, target)) = script.rsplit_once('>')
        {
            let target = target.trim();
            if target.starts_with('/') {
                self.write(target, Contents::Inline(b"<testsuites />\n".to_vec()));
            }
        }
    }
}

fn flag_value<'a>(argv: &'a [String], flag: &str) -> Option<&'a str> {
    argv.windows(2).find(|pair| pair[0] == flag).map(|pair| pair[1].as_str())
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    containers: BTreeMap<String, VirtualContainer>,
    events: Vec<RuntimeEvent>,
}

/// A [`ContainerRuntime`] that keeps everything in memory.
///
/// Exit codes can be scripted per command: the first rule whose needle
/// appears in any argument decides the exit code. Unmatched commands exit 0.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    exit_codes: Vec<(String, i32)>,
    exec_errors: Vec<String>,
    state: Mutex<State>,
}

impl InMemoryRuntime {
    /// Create a runtime where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands with an argument containing `needle` exit with `code`.
    pub fn with_exit_code(mut self, needle: impl Into<String>, code: i32) -> Self {
        self.exit_codes.push((needle.into(), code));
        self
    }

    /// Commands with an argument containing `needle` fail to execute at all,
    /// as if the runtime itself broke.
    pub fn with_exec_error(mut self, needle: impl Into<String>) -> Self {
        self.exec_errors.push(needle.into());
        self
    }

    /// Every operation performed so far, in order.
    pub async fn events(&self) -> Vec<RuntimeEvent> {
        self.state.lock().await.events.clone()
    }

    /// Redacted argument vectors of every executed command, in order.
    pub async fn executed_commands(&self) -> Vec<Vec<String>> {
        self.state
            .lock()
            .await
            .events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::Exec { argv, .. } => Some(argv.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of containers not yet removed.
    pub async fn live_containers(&self) -> usize {
        self.state.lock().await.containers.len()
    }

    fn matches(needle: &str, argv: &[String]) -> bool {
        argv.iter().any(|arg| arg.contains(needle))
    }

    fn exit_code_for(&self, argv: &[String]) -> i32 {
        self.exit_codes
            .iter()
            .find(|(needle, _)| Self::matches(needle, argv))
            .map(|(_, code)| *code)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);

        let mut container = VirtualContainer::default();
        for CacheMount { target, .. } in &spec.cache_mounts {
            container.mkdir(target);
        }
        state.containers.insert(id.clone(), container);
        state.events.push(RuntimeEvent::Create {
            id: id.clone(),
            image: spec.image.clone(),
            env: spec.env.iter().map(|(key, _)| key.clone()).collect(),
            cache_mounts: spec.cache_mounts.iter().map(|m| format!("{}:{}", m.volume, m.target)).collect(),
        });

        info!(image = %spec.image, container = %id, "container started (in-memory)");
        Ok(ContainerId(id))
    }

    async fn copy_in(&self, id: &ContainerId, host_path: &Path, container_path: &str) -> Result<()> {
        let root = host_path.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || read_host_tree(&root)).await.context(StagingTaskSnafu)??;

        let mut state = self.state.lock().await;
        let container = state.containers.get_mut(&id.0).context(ContainerNotFoundSnafu { id: id.0.clone() })?;

        let mut files = Vec::with_capacity(entries.len());
        match entries {
            HostTree::File(contents) => container.write(container_path, Contents::Inline(contents)),
            HostTree::Directory(entries) => {
                container.mkdir(container_path);
                let base = container_path.trim_end_matches('/');
                for (relative, source) in entries {
                    container.write(&format!("{base}/{relative}"), Contents::Host(source));
                    files.push(relative);
                }
            }
        }

        state.events.push(RuntimeEvent::CopyIn {
            id: id.0.clone(),
            container_path: container_path.to_string(),
            files,
        });
        Ok(())
    }

    async fn exec(&self, id: &ContainerId, request: &ExecRequest) -> Result<ExecOutcome> {
        let command = redact_args(&request.argv);
        let mut state = self.state.lock().await;
        let container = state.containers.get_mut(&id.0).context(ContainerNotFoundSnafu { id: id.0.clone() })?;

        if self.exec_errors.iter().any(|needle| Self::matches(needle, &request.argv)) {
            return Err(ExecutorError::RuntimeCommand {
                operation: "exec".to_string(),
                exit_code: 125,
                stderr: format!("simulated runtime failure for `{}`", command.join(" ")),
            });
        }

        let exit_code = self.exit_code_for(&request.argv);
        container.simulate_outputs(&request.argv);
        state.events.push(RuntimeEvent::Exec {
            id: id.0.clone(),
            argv: command.clone(),
            exit_code,
        });

        info!(container = %id, command = %command.join(" "), exit_code, "command finished (in-memory)");

        if request.expect == ExitPolicy::Success && exit_code != 0 {
            return ExecFailedSnafu {
                id: id.0.clone(),
                command: command.join(" "),
                exit_code,
                stderr_tail: String::new(),
            }
            .fail();
        }

        Ok(ExecOutcome {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        })
    }

    async fn copy_out(&self, id: &ContainerId, container_path: &str, host_path: &Path, kind: EntryKind) -> Result<()> {
        let mut state = self.state.lock().await;
        let container = state.containers.get(&id.0).context(ContainerNotFoundSnafu { id: id.0.clone() })?;

        let not_found = ContainerPathNotFoundSnafu {
            id: id.0.clone(),
            path: container_path.to_string(),
        };
        let writes: Vec<(PathBuf, Contents)> = match kind {
            EntryKind::File => {
                let contents = container.files.get(container_path).context(not_found)?;
                vec![(host_path.to_path_buf(), contents.clone())]
            }
            EntryKind::Directory => {
                snafu::ensure!(container.is_dir(container_path), not_found);
                container
                    .files_under(container_path)
                    .into_iter()
                    .map(|(relative, contents)| (host_path.join(relative), contents))
                    .collect()
            }
        };

        if kind == EntryKind::Directory {
            tokio::fs::create_dir_all(host_path).await.context(ExportSnafu { path: host_path })?;
        }
        for (path, contents) in writes {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.context(ExportSnafu { path: parent })?;
            }
            match contents {
                Contents::Inline(bytes) => tokio::fs::write(&path, bytes).await.context(ExportSnafu { path: &path })?,
                Contents::Host(source) => {
                    tokio::fs::copy(&source, &path).await.context(ExportSnafu { path: &path })?;
                }
            }
        }

        state.events.push(RuntimeEvent::CopyOut {
            id: id.0.clone(),
            container_path: container_path.to_string(),
            host_path: host_path.to_path_buf(),
        });
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.containers.remove(&id.0).context(ContainerNotFoundSnafu { id: id.0.clone() })?;
        state.events.push(RuntimeEvent::Remove { id: id.0.clone() });
        info!(container = %id, "container removed (in-memory)");
        Ok(())
    }
}

enum HostTree {
    File(Vec<u8>),
    /// Relative path and host path of every regular file.
    Directory(Vec<(String, PathBuf)>),
}

impl HostTree {
    fn len(&self) -> usize {
        match self {
            HostTree::File(_) => 0,
            HostTree::Directory(entries) => entries.len(),
        }
    }
}

fn read_host_tree(root: &Path) -> Result<HostTree> {
    let metadata = std::fs::metadata(root).context(StageWorkspaceSnafu { path: root })?;
    if !metadata.is_dir() {
        let contents = std::fs::read(root).context(StageWorkspaceSnafu { path: root })?;
        return Ok(HostTree::File(contents));
    }

    let mut entries = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).context(StageWorkspaceSnafu { path: &dir })? {
            let entry = entry.context(StageWorkspaceSnafu { path: &dir })?;
            let path = entry.path();
            let file_type = entry.file_type().context(StageWorkspaceSnafu { path: &path })?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");
                entries.push((relative, path));
            }
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(HostTree::Directory(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(argv: &[&str], expect: ExitPolicy) -> ExecRequest {
        ExecRequest {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            expect,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_copy_roundtrip_through_virtual_fs() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();

        let host = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(host.path().join("in/Assets")).unwrap();
        std::fs::write(host.path().join("in/Assets/a.cs"), "class A {}").unwrap();

        runtime.copy_in(&id, &host.path().join("in"), "/src").await.unwrap();
        runtime.copy_out(&id, "/src", &host.path().join("out"), EntryKind::Directory).await.unwrap();

        let copied = std::fs::read_to_string(host.path().join("out/Assets/a.cs")).unwrap();
        assert_eq!(copied, "class A {}");
    }

    #[tokio::test]
    async fn test_directory_copy_does_not_load_contents() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();

        let host = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(host.path().join("in/Assets")).unwrap();
        // Sparse, so it costs no disk; reading it would need 8 GiB of memory.
        let huge = std::fs::File::create(host.path().join("in/Assets/huge.bundle")).unwrap();
        huge.set_len(8 * 1024 * 1024 * 1024).unwrap();
        drop(huge);

        runtime.copy_in(&id, &host.path().join("in"), "/src").await.unwrap();

        let events = runtime.events().await;
        assert!(matches!(
            &events[1],
            RuntimeEvent::CopyIn { files, .. } if files == &vec!["Assets/huge.bundle".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_missing_path_is_reported() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();
        let host = tempfile::TempDir::new().unwrap();

        let err = runtime.copy_out(&id, "/nope", host.path(), EntryKind::Directory).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ContainerPathNotFound { .. }));
    }

    #[tokio::test]
    async fn test_scripted_exit_codes_and_policy() {
        let runtime = InMemoryRuntime::new().with_exit_code("-runTests", 2);
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();

        let outcome = runtime.exec(&id, &request(&["unity-editor", "-runTests"], ExitPolicy::Any)).await.unwrap();
        assert_eq!(outcome.exit_code, 2);

        let err = runtime.exec(&id, &request(&["unity-editor", "-runTests"], ExitPolicy::Success)).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ExecFailed { exit_code: 2, .. }));

        let ok = runtime.exec(&id, &request(&["true"], ExitPolicy::Success)).await.unwrap();
        assert!(ok.is_success());
    }

    #[tokio::test]
    async fn test_exec_records_redacted_argv() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();
        runtime.exec(&id, &request(&["-password", "hunter2"], ExitPolicy::Any)).await.unwrap();

        let commands = runtime.executed_commands().await;
        assert_eq!(commands, vec![vec!["-password".to_string(), "***".to_string()]]);
    }

    #[tokio::test]
    async fn test_shell_redirect_creates_target() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();
        runtime.exec(&id, &request(&["sh", "-c", "tool -s in.xml > /results/out.xml"], ExitPolicy::Success)).await.unwrap();

        let host = tempfile::TempDir::new().unwrap();
        let target = host.path().join("out.xml");
        runtime.copy_out(&id, "/results/out.xml", &target, EntryKind::File).await.unwrap();
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_removed_container_is_gone() {
        let runtime = InMemoryRuntime::new();
        let id = runtime.create(&ContainerSpec::default()).await.unwrap();
        assert_eq!(runtime.live_containers().await, 1);

        runtime.remove(&id).await.unwrap();
        assert_eq!(runtime.live_containers().await, 0);
        assert!(matches!(runtime.remove(&id).await, Err(ExecutorError::ContainerNotFound { .. })));
    }
}
