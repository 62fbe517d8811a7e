//! Run configuration types.
//!
//! A [`RunConfig`] is built once per invocation and never mutated. Pipeline
//! stages borrow it and hand their own results forward as new values.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use snafu::ensure;

use crate::constants::BUILDS_PATH;
use crate::constants::RESULTS_PATH;
use crate::error::InvalidRunConfigSnafu;
use crate::error::Result;
use crate::secret::SecretRef;
use crate::verified::is_safe_path_component;

/// What a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Build the player into `/builds`.
    Build,
    /// Run the test suite into `/results`.
    Test {
        /// Editor test platform (`editmode`, `playmode`, or a player target).
        test_platform: String,
        /// Optional stylesheet converting NUnit results to JUnit.
        junit_transform: Option<PathBuf>,
    },
}

impl RunMode {
    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Build => "build",
            RunMode::Test { .. } => "test",
        }
    }

    /// Directory inside the environment returned as the run's result.
    pub fn artifact_path(&self) -> &'static str {
        match self {
            RunMode::Build => BUILDS_PATH,
            RunMode::Test { .. } => RESULTS_PATH,
        }
    }
}

/// How a failing primary command affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// A non-zero editor exit fails the run.
    #[default]
    Strict,
    /// A non-zero editor exit is logged and the run still returns artifacts.
    Tolerant,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ErrorPolicy::Strict),
            "tolerant" => Ok(ErrorPolicy::Tolerant),
            _ => Err(format!("invalid error policy: {}", s)),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Strict => f.write_str("strict"),
            ErrorPolicy::Tolerant => f.write_str("tolerant"),
        }
    }
}

/// Inputs for one build or test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Project tree on the host.
    pub project_dir: PathBuf,
    /// Account used for license activation.
    pub user: String,
    /// Editor image platform module (e.g. `webgl`, `linux-il2cpp`).
    pub platform: String,
    /// Editor build target (e.g. `StandaloneLinux64`).
    pub build_target: String,
    /// Editor image operating system (e.g. `ubuntu`).
    pub os: String,
    /// Name of the produced player.
    pub build_name: String,
    /// Account password.
    pub password: SecretRef,
    /// Serial number for a serial-based license.
    pub serial: Option<SecretRef>,
    /// Personal license file.
    pub license_file: Option<PathBuf>,
    /// Floating license service configuration.
    pub service_config: Option<PathBuf>,
    /// Build or test.
    pub mode: RunMode,
}

impl RunConfig {
    /// Validate the configuration.
    ///
    /// Values that end up in image tags, container paths, or the converter's
    /// shell pipeline must be plain path components.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.user.trim().is_empty(),
            InvalidRunConfigSnafu {
                reason: "user cannot be empty"
            }
        );

        for (field, value) in [("platform", &self.platform), ("os", &self.os), ("build target", &self.build_target)] {
            ensure!(
                is_safe_path_component(value),
                InvalidRunConfigSnafu {
                    reason: format!("{field} {value:?} must contain only letters, digits, '-', '_' or '.'"),
                }
            );
        }

        ensure!(
            !self.build_name.is_empty() && !self.build_name.contains('/') && self.build_name != "..",
            InvalidRunConfigSnafu {
                reason: format!("build name {:?} must be a single non-empty path component", self.build_name),
            }
        );

        if let RunMode::Test { test_platform, .. } = &self.mode {
            ensure!(
                is_safe_path_component(test_platform),
                InvalidRunConfigSnafu {
                    reason: format!(
                        "test platform {test_platform:?} must contain only letters, digits, '-', '_' or '.'"
                    ),
                }
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mode: RunMode) -> RunConfig {
        RunConfig {
            project_dir: PathBuf::from("/tmp/project"),
            user: "ci@example.com".into(),
            platform: "linux-il2cpp".into(),
            build_target: "StandaloneLinux64".into(),
            os: "ubuntu".into(),
            build_name: "My Game".into(),
            password: SecretRef::Env("UNITY_PASSWORD".into()),
            serial: None,
            license_file: None,
            service_config: None,
            mode,
        }
    }

    #[test]
    fn test_mode_artifact_paths() {
        assert_eq!(RunMode::Build.artifact_path(), "/builds");
        let test = RunMode::Test {
            test_platform: "editmode".into(),
            junit_transform: None,
        };
        assert_eq!(test.artifact_path(), "/results");
        assert_eq!(test.name(), "test");
    }

    #[test]
    fn test_valid_config() {
        assert!(sample(RunMode::Build).validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_user() {
        let config = RunConfig {
            user: " ".into(),
            ..sample(RunMode::Build)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsafe_tag_components() {
        let config = RunConfig {
            platform: "webgl:latest".into(),
            ..sample(RunMode::Build)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsafe_test_platform() {
        let config = sample(RunMode::Test {
            test_platform: "editmode; reboot".into(),
            junit_transform: None,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("test platform"));
    }

    #[test]
    fn test_error_policy_parse() {
        assert_eq!("STRICT".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Strict));
        assert_eq!("tolerant".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Tolerant));
        assert!("lenient".parse::<ErrorPolicy>().is_err());
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Strict);
    }
}
