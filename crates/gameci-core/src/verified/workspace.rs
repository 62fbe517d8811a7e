//! Workspace filtering rules.

use crate::constants::EXCLUDED_DIRECTORIES;
use crate::constants::EXCLUDED_FILES;
use crate::constants::LIBRARY_DIR_NAME;

/// Check whether a root-level entry is stripped before the project reaches
/// an environment.
///
/// Matching is by name only, so a `.git` file left by a worktree is removed
/// the same way as a `.git` directory. Nested entries with these names are
/// kept.
///
/// # Example
///
/// ```
/// use gameci_core::verified::is_excluded_root_entry;
///
/// assert!(is_excluded_root_entry(".git"));
/// assert!(is_excluded_root_entry("README.md"));
/// assert!(!is_excluded_root_entry("Assets"));
/// ```
pub fn is_excluded_root_entry(name: &str) -> bool {
    EXCLUDED_DIRECTORIES.contains(&name) || EXCLUDED_FILES.contains(&name)
}

/// Check whether a root-level entry is shadowed by the library cache mount.
pub fn is_cache_shadowed_root_entry(name: &str) -> bool {
    name == LIBRARY_DIR_NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_listed_entries_excluded() {
        for name in [
            ".git",
            ".dagger",
            ".vscode",
            ".gitignore",
            ".gitmodules",
            ".DS_Store",
            "dagger.json",
            "go.work",
            "LICENSE",
            "README.md",
        ] {
            assert!(is_excluded_root_entry(name), "{name} should be excluded");
        }
    }

    #[test]
    fn test_project_entries_kept() {
        for name in ["Assets", "Packages", "ProjectSettings", "readme.md", "LICENSE.txt", ".github"] {
            assert!(!is_excluded_root_entry(name), "{name} should be kept");
        }
    }

    #[test]
    fn test_library_is_cache_shadowed() {
        assert!(is_cache_shadowed_root_entry("Library"));
        assert!(!is_cache_shadowed_root_entry("library"));
        assert!(!is_excluded_root_entry("Library"));
    }
}
