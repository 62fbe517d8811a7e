//! Error types for gameci core logic.
//!
//! All errors use `snafu` so callers get context selectors and preserved
//! source chains.

use std::path::PathBuf;

use snafu::Snafu;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while resolving run inputs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoreError {
    // ========================================================================
    // Version Errors
    // ========================================================================
    /// Project version marker could not be read.
    #[snafu(display("Failed to read project version file {}: {source}", path.display()))]
    ReadVersionFile {
        /// Path to the marker.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Project version marker exceeds the size bound.
    #[snafu(display("Project version file {} too large: {size} bytes (max: {max})", path.display()))]
    VersionFileTooLarge {
        /// Path to the marker.
        path: PathBuf,
        /// Actual size.
        size: u64,
        /// Maximum allowed.
        max: u64,
    },

    /// First line of the marker has no `": "` separator.
    #[snafu(display("Malformed project version line {line:?}: missing \": \" separator"))]
    MissingVersionSeparator {
        /// The offending first line.
        line: String,
    },

    /// The version segment is empty.
    #[snafu(display("Project version line {line:?} has an empty version"))]
    EmptyVersion {
        /// The offending first line.
        line: String,
    },

    // ========================================================================
    // License Errors
    // ========================================================================
    /// More than one license credential variant was supplied.
    #[snafu(display("Conflicting license credentials supplied: {}; pass exactly one", supplied.join(", ")))]
    ConflictingLicenses {
        /// Names of the supplied variants.
        supplied: Vec<&'static str>,
    },

    // ========================================================================
    // Secret Errors
    // ========================================================================
    /// Secret reference is not `env:NAME` or `file:PATH`.
    #[snafu(display("Invalid secret reference {reference:?}: expected env:NAME or file:PATH"))]
    InvalidSecretRef {
        /// The reference as given (never a plaintext value).
        reference: String,
    },

    /// Environment-backed secret could not be read.
    #[snafu(display("Failed to read secret from environment variable {name}: {source}"))]
    SecretEnv {
        /// Variable name.
        name: String,
        /// Underlying error.
        source: std::env::VarError,
    },

    /// File-backed secret could not be read.
    #[snafu(display("Failed to read secret file {}: {source}", path.display()))]
    SecretFile {
        /// Secret file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// File-backed secret exceeds the size bound.
    #[snafu(display("Secret file {} too large: {size} bytes (max: {max})", path.display()))]
    SecretTooLarge {
        /// Secret file path.
        path: PathBuf,
        /// Actual size.
        size: u64,
        /// Maximum allowed.
        max: u64,
    },

    /// Secret resolved to an empty value.
    #[snafu(display("Secret {reference} is empty"))]
    EmptySecret {
        /// The reference that resolved to nothing.
        reference: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings file could not be read.
    #[snafu(display("Failed to read settings file {}: {source}", path.display()))]
    ReadSettings {
        /// Path to the file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for `PipelineSettings`.
    #[snafu(display("Failed to parse settings file {}: {source}", path.display()))]
    ParseSettings {
        /// Path to the file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Settings failed validation.
    #[snafu(display("Invalid settings: {reason}"))]
    InvalidSettings {
        /// Reason for invalidity.
        reason: String,
    },

    /// Run configuration failed validation.
    #[snafu(display("Invalid run configuration: {reason}"))]
    InvalidRunConfig {
        /// Reason for invalidity.
        reason: String,
    },
}
