//! Editor image naming.

/// Build the editor image reference for a run.
///
/// Format: `<repository>:<os>-<version>-<platform>-<toolchain>`.
///
/// # Example
///
/// ```
/// use gameci_core::verified::editor_image_reference;
///
/// assert_eq!(
///     editor_image_reference("unityci/editor", "ubuntu", "2021.3.5f1", "webgl", "3.1.0"),
///     "unityci/editor:ubuntu-2021.3.5f1-webgl-3.1.0"
/// );
/// ```
pub fn editor_image_reference(repository: &str, os: &str, version: &str, platform: &str, toolchain: &str) -> String {
    format!("{repository}:{os}-{version}-{platform}-{toolchain}")
}
