//! Project version marker parsing.

use crate::constants::PROJECT_VERSION_SEPARATOR;

/// Failure to extract a version from the marker contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// First line has no `": "` separator.
    MissingSeparator {
        /// The first line as read
        line: String,
    },
    /// Separator present but nothing follows it.
    EmptyVersion {
        /// The first line as read
        line: String,
    },
}

/// Extract the editor version from the contents of `ProjectVersion.txt`.
///
/// Takes the first line, splits it on `": "`, and returns the second
/// segment. The segment is not checked for being a well-formed version.
///
/// # Example
///
/// ```
/// use gameci_core::verified::parse_project_version;
///
/// let contents = "m_EditorVersion: 2021.3.5f1\nm_EditorVersionWithRevision: 2021.3.5f1 (40eb3a945986)\n";
/// assert_eq!(parse_project_version(contents), Ok("2021.3.5f1"));
/// assert!(parse_project_version("m_EditorVersion=2021.3.5f1").is_err());
/// ```
pub fn parse_project_version(contents: &str) -> Result<&str, VersionParseError> {
    let line = contents.lines().next().unwrap_or("");

    match line.split(PROJECT_VERSION_SEPARATOR).nth(1) {
        None => Err(VersionParseError::MissingSeparator { line: line.to_string() }),
        Some("") => Err(VersionParseError::EmptyVersion { line: line.to_string() }),
        Some(version) => Ok(version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_marker() {
        let contents = "m_EditorVersion: 2021.3.5f1\nm_EditorVersionWithRevision: 2021.3.5f1 (40eb3a945986)";
        assert_eq!(parse_project_version(contents), Ok("2021.3.5f1"));
    }

    #[test]
    fn test_parse_crlf_marker() {
        assert_eq!(parse_project_version("m_EditorVersion: 2022.3.10f1\r\n"), Ok("2022.3.10f1"));
    }

    #[test]
    fn test_only_first_line_is_considered() {
        let contents = "garbage\nm_EditorVersion: 2021.3.5f1\n";
        assert!(matches!(parse_project_version(contents), Err(VersionParseError::MissingSeparator { .. })));
    }

    #[test]
    fn test_second_segment_only() {
        // Extra separators are split off, matching a plain split-and-index.
        assert_eq!(parse_project_version("a: b: c"), Ok("b"));
    }

    #[test]
    fn test_malformed_content_passes_through() {
        assert_eq!(parse_project_version("m_EditorVersion: not-a-version"), Ok("not-a-version"));
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            parse_project_version("m_EditorVersion:2021.3.5f1"),
            Err(VersionParseError::MissingSeparator {
                line: "m_EditorVersion:2021.3.5f1".to_string()
            })
        );
    }

    #[test]
    fn test_empty_contents() {
        assert!(matches!(parse_project_version(""), Err(VersionParseError::MissingSeparator { .. })));
    }

    #[test]
    fn test_empty_version() {
        assert!(matches!(parse_project_version("m_EditorVersion: "), Err(VersionParseError::EmptyVersion { .. })));
    }
}
