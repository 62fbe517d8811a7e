//! Core types and deterministic logic for gameci.
//!
//! gameci builds and tests Unity projects inside disposable containers. This
//! crate holds everything that does not need a container runtime:
//!
//! - **Run configuration**: the immutable [`RunConfig`] and layered
//!   [`PipelineSettings`]
//! - **Version resolution**: reading the editor version from
//!   `ProjectSettings/ProjectVersion.txt`
//! - **License selection**: resolving the optional inputs into at most one
//!   [`LicenseCredential`]
//! - **Secrets**: `env:` and `file:` references with redacted formatting
//! - **Verified functions**: image naming, editor argument vectors, and
//!   workspace filtering rules
//!
//! The container work itself lives in `gameci-executor`.

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod license;
pub mod secret;
pub mod verified;
pub mod version;

pub use config::ErrorPolicy;
pub use config::PipelineSettings;
pub use config::SettingsOverlay;
pub use config::RunConfig;
pub use config::RunMode;
pub use error::CoreError;
pub use license::LicenseCredential;
pub use license::LicenseKind;
pub use secret::SecretRef;
pub use secret::SecretValue;
pub use version::resolve_project_version;
