//! Fixed paths, defaults, and resource bounds for gameci runs.
//!
//! Every path that the editor image, the licensing client, or the report
//! converter expects lives here so the argument builders and the executor
//! agree on them.

// ============================================================================
// Environment layout
// ============================================================================

/// Project root inside the build environment.
pub const PROJECT_PATH: &str = "/src";

/// Editor library cache inside the build environment.
///
/// A persistent cache volume is mounted here so incremental import state
/// survives between runs.
pub const LIBRARY_CACHE_PATH: &str = "/src/Library/";

/// Name of the library directory relative to the project root.
pub const LIBRARY_DIR_NAME: &str = "Library";

/// Build output directory.
pub const BUILDS_PATH: &str = "/builds";

/// Test results directory.
pub const RESULTS_PATH: &str = "/results";

/// Personal license file location inside the build environment.
pub const PERSONAL_LICENSE_PATH: &str = "/root/.local/share/unity3d/Unity/Unity_lic.ulf";

/// Floating license service configuration location.
pub const SERVICE_CONFIG_PATH: &str = "/usr/share/unity3d/config/services-config.json";

/// Licensing client binary used to acquire a floating license.
pub const LICENSING_CLIENT_PATH: &str = "/opt/unity/Editor/Data/Resources/Licensing/Client/Unity.Licensing.Client";

/// Stylesheet location inside the report converter environment.
pub const JUNIT_TRANSFORM_PATH: &str = "/nunit-transforms/nunit3-junit.xslt";

/// Project version marker, relative to the project root.
pub const PROJECT_VERSION_FILE: &str = "ProjectSettings/ProjectVersion.txt";

/// Separator between the key and the version on the marker's first line.
pub const PROJECT_VERSION_SEPARATOR: &str = ": ";

// ============================================================================
// Workspace filtering
// ============================================================================

/// Root-level directories removed before the project reaches an environment.
pub const EXCLUDED_DIRECTORIES: &[&str] = &[".git", ".dagger", ".vscode"];

/// Root-level files removed before the project reaches an environment.
pub const EXCLUDED_FILES: &[&str] = &[
    ".gitignore",
    ".gitmodules",
    ".DS_Store",
    "dagger.json",
    "go.work",
    "LICENSE",
    "README.md",
];

// ============================================================================
// Defaults
// ============================================================================

/// Default editor image repository.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "unityci/editor";

/// Default editor image toolchain suffix.
pub const DEFAULT_TOOLCHAIN_VERSION: &str = "3.1.0";

/// Default name of the library cache volume.
pub const DEFAULT_CACHE_VOLUME: &str = "lib";

/// Default base image for the report converter.
pub const DEFAULT_CONVERTER_IMAGE: &str = "eclipse-temurin";

/// Default container CLI.
pub const DEFAULT_CONTAINER_BINARY: &str = "docker";

/// XSLT processor package installed into the converter environment.
pub const XSLT_PACKAGE: &str = "libsaxonb-java";

/// Editor method invoked to perform a build.
pub const BUILD_ENTRY_POINT: &str = "BuildCommand.PerformBuild";

/// Coverage options passed to test runs.
pub const COVERAGE_OPTIONS: &str =
    "'generateAdditionalMetrics;generateHtmlReport;generateHtmlReportHistory;generateBadgeReport;verbosity:verbose'";

/// Environment variable set on every build environment to defeat layer caching.
pub const CACHE_BUSTER_ENV: &str = "CACHEBUSTER";

// ============================================================================
// Bounds
// ============================================================================

/// Maximum size of the project version marker (64 KB).
pub const MAX_VERSION_FILE_BYTES: u64 = 64 * 1024;

/// Maximum size of a file-backed secret (64 KB).
pub const MAX_SECRET_FILE_BYTES: u64 = 64 * 1024;

/// Maximum size of the settings file (1 MB).
pub const MAX_SETTINGS_FILE_BYTES: u64 = 1024 * 1024;

/// Maximum per-command timeout (24 hours).
pub const MAX_EXEC_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Placeholder used in logged argument vectors in place of secret values.
pub const REDACTED: &str = "***";
