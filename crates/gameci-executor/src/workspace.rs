//! Workspace staging.
//!
//! The project tree is copied into a scratch directory with VCS, editor, and
//! pipeline metadata stripped from its root. The staged copy is what the
//! version resolver reads and what is copied into the build environment; the
//! caller's tree is never modified.

use std::path::Path;
use std::path::PathBuf;

use gameci_core::verified::is_cache_shadowed_root_entry;
use gameci_core::verified::is_excluded_root_entry;
use serde::Serialize;
use snafu::ResultExt;
use snafu::ensure;
use tempfile::TempDir;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::CreateScratchSnafu;
use crate::error::ProjectNotFoundSnafu;
use crate::error::Result;
use crate::error::StageWorkspaceSnafu;
use crate::error::StagingTaskSnafu;
use crate::error::WorkspaceTooDeepSnafu;

/// Maximum directory nesting below the project root.
const MAX_TREE_DEPTH: u32 = 100;

/// Counters describing a staged workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    /// Files copied.
    pub files: u64,
    /// Bytes copied.
    pub bytes: u64,
    /// Root entries left out, by name.
    pub excluded: Vec<String>,
    /// Symlinks skipped anywhere in the tree.
    pub symlinks_skipped: u64,
}

/// A filtered copy of the project, deleted when dropped.
#[derive(Debug)]
pub struct PreparedWorkspace {
    dir: TempDir,
    stats: StageStats,
}

impl PreparedWorkspace {
    /// Root of the staged copy.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// What was copied and what was left out.
    pub fn stats(&self) -> &StageStats {
        &self.stats
    }
}

/// Stage `project_dir` into a scratch directory.
///
/// Root-level metadata entries and the `Library` directory are left out.
/// Entries that do not exist are simply absent from the copy.
pub async fn prepare_workspace(project_dir: &Path) -> Result<PreparedWorkspace> {
    let is_dir = tokio::fs::metadata(project_dir).await.map(|m| m.is_dir()).unwrap_or(false);
    ensure!(is_dir, ProjectNotFoundSnafu { path: project_dir });

    let dir = TempDir::with_prefix("gameci-workspace-").context(CreateScratchSnafu)?;
    let source = project_dir.to_path_buf();
    let target = dir.path().to_path_buf();

    let stats = tokio::task::spawn_blocking(move || stage_tree(&source, &target)).await.context(StagingTaskSnafu)??;

    info!(
        project = %project_dir.display(),
        files = stats.files,
        bytes = stats.bytes,
        excluded = ?stats.excluded,
        "workspace staged"
    );

    Ok(PreparedWorkspace { dir, stats })
}

fn stage_tree(source: &Path, target: &Path) -> Result<StageStats> {
    let mut stats = StageStats::default();
    let mut pending: Vec<(PathBuf, PathBuf, u32)> = Vec::new();

    for entry in read_sorted(source)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_excluded_root_entry(&name) || is_cache_shadowed_root_entry(&name) {
            debug!(entry = %name, "excluding root entry");
            stats.excluded.push(name);
            continue;
        }
        pending.push((entry.path(), target.join(entry.file_name()), 1));
    }

    while let Some((from, to, depth)) = pending.pop() {
        ensure!(
            depth <= MAX_TREE_DEPTH,
            WorkspaceTooDeepSnafu {
                path: from,
                max_depth: MAX_TREE_DEPTH,
            }
        );

        let file_type = std::fs::symlink_metadata(&from).context(StageWorkspaceSnafu { path: &from })?.file_type();
        if file_type.is_symlink() {
            warn!(path = %from.display(), "skipping symlink in project tree");
            stats.symlinks_skipped += 1;
        } else if file_type.is_dir() {
            std::fs::create_dir_all(&to).context(StageWorkspaceSnafu { path: &to })?;
            for entry in read_sorted(&from)? {
                pending.push((entry.path(), to.join(entry.file_name()), depth + 1));
            }
        } else if file_type.is_file() {
            stats.bytes += std::fs::copy(&from, &to).context(StageWorkspaceSnafu { path: &from })?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

fn read_sorted(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let mut entries = std::fs::read_dir(dir)
        .context(StageWorkspaceSnafu { path: dir })?
        .collect::<std::io::Result<Vec<_>>>()
        .context(StageWorkspaceSnafu { path: dir })?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, relative).unwrap();
    }

    #[tokio::test]
    async fn test_strips_root_metadata() {
        let project = TempDir::new().unwrap();
        for relative in [
            ".git/HEAD",
            ".dagger/config",
            ".vscode/settings.json",
            ".gitignore",
            ".gitmodules",
            ".DS_Store",
            "dagger.json",
            "go.work",
            "LICENSE",
            "README.md",
            "Library/cache.bin",
            "Assets/Scripts/Player.cs",
            "ProjectSettings/ProjectVersion.txt",
        ] {
            touch(project.path(), relative);
        }

        let staged = prepare_workspace(project.path()).await.unwrap();

        assert!(staged.path().join("Assets/Scripts/Player.cs").is_file());
        assert!(staged.path().join("ProjectSettings/ProjectVersion.txt").is_file());
        for gone in [".git", ".dagger", ".vscode", ".gitignore", "README.md", "LICENSE", "Library", "go.work"] {
            assert!(!staged.path().join(gone).exists(), "{gone} should not be staged");
        }
        assert_eq!(staged.stats().files, 2);
        assert_eq!(staged.stats().excluded.len(), 11);

        // The caller's tree is untouched.
        assert!(project.path().join(".git/HEAD").is_file());
    }

    #[tokio::test]
    async fn test_nested_names_are_kept() {
        let project = TempDir::new().unwrap();
        touch(project.path(), "Assets/README.md");
        touch(project.path(), "Packages/Library/notes.txt");

        let staged = prepare_workspace(project.path()).await.unwrap();
        assert!(staged.path().join("Assets/README.md").is_file());
        assert!(staged.path().join("Packages/Library/notes.txt").is_file());
    }

    #[tokio::test]
    async fn test_missing_project_fails() {
        let parent = TempDir::new().unwrap();
        let err = prepare_workspace(&parent.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, crate::error::ExecutorError::ProjectNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_skipped() {
        let project = TempDir::new().unwrap();
        touch(project.path(), "Assets/real.cs");
        std::os::unix::fs::symlink(project.path().join("Assets/real.cs"), project.path().join("Assets/link.cs")).unwrap();

        let staged = prepare_workspace(project.path()).await.unwrap();
        assert!(staged.path().join("Assets/real.cs").is_file());
        assert!(!staged.path().join("Assets/link.cs").exists());
        assert_eq!(staged.stats().symlinks_skipped, 1);
    }
}
