//! Engine version resolution from a project tree.

use std::path::Path;

use snafu::ResultExt;
use snafu::ensure;
use tracing::debug;

use crate::constants::MAX_VERSION_FILE_BYTES;
use crate::constants::PROJECT_VERSION_FILE;
use crate::error::CoreError;
use crate::error::ReadVersionFileSnafu;
use crate::error::Result;
use crate::error::VersionFileTooLargeSnafu;
use crate::verified::VersionParseError;
use crate::verified::parse_project_version;

/// Read the editor version recorded in `ProjectSettings/ProjectVersion.txt`.
///
/// # Errors
///
/// - `CoreError::ReadVersionFile` if the marker is missing or unreadable
/// - `CoreError::MissingVersionSeparator` if the first line has no `": "`
/// - `CoreError::EmptyVersion` if nothing follows the separator
pub fn resolve_project_version(project_dir: &Path) -> Result<String> {
    let path = project_dir.join(PROJECT_VERSION_FILE);

    let size = std::fs::metadata(&path).context(ReadVersionFileSnafu { path: path.clone() })?.len();
    ensure!(
        size <= MAX_VERSION_FILE_BYTES,
        VersionFileTooLargeSnafu {
            path: path.clone(),
            size,
            max: MAX_VERSION_FILE_BYTES,
        }
    );

    let contents = std::fs::read_to_string(&path).context(ReadVersionFileSnafu { path: path.clone() })?;

    let version = parse_project_version(&contents).map_err(|e| match e {
        VersionParseError::MissingSeparator { line } => CoreError::MissingVersionSeparator { line },
        VersionParseError::EmptyVersion { line } => CoreError::EmptyVersion { line },
    })?;

    debug!(path = %path.display(), version, "resolved project version");
    Ok(version.to_string())
}
