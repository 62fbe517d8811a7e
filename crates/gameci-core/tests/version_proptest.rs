//! Property tests for project version parsing.

use gameci_core::verified::VersionParseError;
use gameci_core::verified::parse_project_version;
use proptest::prelude::*;

proptest! {
    #[test]
    fn version_is_second_segment_of_first_line(
        key in "[A-Za-z_]{1,20}",
        version in "[0-9a-z.]{1,16}",
        rest in "(\n[ -~]{0,40}){0,4}",
    ) {
        let contents = format!("{key}: {version}{rest}");
        prop_assert_eq!(parse_project_version(&contents), Ok(version.as_str()));
    }

    #[test]
    fn first_line_without_separator_is_rejected(line in "[^:\r\n]{0,60}", rest in "[ -~\n]{0,60}") {
        let contents = format!("{line}\n{rest}");
        let is_missing_separator = matches!(
            parse_project_version(&contents),
            Err(VersionParseError::MissingSeparator { .. })
        );
        prop_assert!(is_missing_separator);
    }
}
