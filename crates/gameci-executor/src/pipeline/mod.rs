//! The build/test pipeline.
//!
//! # Stages
//!
//! ```text
//! RunConfig ─► validate ─► resolve license ─► stage workspace ─► resolve version
//!                                                                     │
//!              ┌──────────────────────────────────────────────────────┘
//!              ▼
//!   start environment ─► copy /src ─► register ─► editor command ─► release
//!                                                                     │
//!              ┌──────────────────────────────────────────────────────┘
//!              ▼
//!   error check ─► convert report (test + stylesheet) ─► export ─► destroy
//! ```
//!
//! The release step runs whenever the editor command was attempted, and the
//! environment is destroyed on every path once it exists. Nothing is
//! retried; each command executes at most once.

mod artifacts;
mod converter;
mod license;
mod runner;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use artifacts::ArtifactDirectory;
use chrono::Utc;
use gameci_core::ErrorPolicy;
use gameci_core::LicenseCredential;
use gameci_core::LicenseKind;
use gameci_core::PipelineSettings;
use gameci_core::RunConfig;
use gameci_core::RunMode;
use gameci_core::constants::CACHE_BUSTER_ENV;
use gameci_core::constants::LIBRARY_CACHE_PATH;
use gameci_core::constants::PROJECT_PATH;
use gameci_core::resolve_project_version;
use gameci_core::verified::editor_image_reference;
use serde::Serialize;
use snafu::ensure;
use tracing::info;
use tracing::warn;

use crate::environment::Environment;
use crate::environment::with_cleanup;
use crate::error::HostFileNotFoundSnafu;
use crate::error::Result;
use crate::runtime::CacheMount;
use crate::runtime::ContainerRuntime;
use crate::runtime::ContainerSpec;
use crate::runtime::ExecOutcome;
use crate::workspace::PreparedWorkspace;
use crate::workspace::StageStats;
use crate::workspace::prepare_workspace;

/// Exit status and duration of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    /// Exit code.
    pub exit_code: i32,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl From<&ExecOutcome> for StepStatus {
    fn from(outcome: &ExecOutcome) -> Self {
        Self {
            exit_code: outcome.exit_code,
            duration_ms: outcome.duration_ms,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `build` or `test`.
    pub mode: &'static str,
    /// Editor image the run used.
    pub image: String,
    /// Editor version read from the project.
    pub project_version: String,
    /// License strategy applied, if any.
    pub license: Option<LicenseKind>,
    /// License activation status.
    pub registration: Option<StepStatus>,
    /// Editor command status.
    pub primary: StepStatus,
    /// License return status.
    pub release: StepStatus,
    /// Policy the error check ran under.
    pub error_policy: ErrorPolicy,
    /// True when the editor failed and the tolerant policy let the run continue.
    pub tool_failed: bool,
    /// JUnit report path inside the environment, when converted.
    pub junit_report: Option<String>,
    /// Exported output directory.
    pub artifacts: ArtifactDirectory,
    /// What was staged from the project tree.
    pub workspace: StageStats,
}

/// What the in-environment stages produce.
struct StageOutput {
    registration: Option<StepStatus>,
    primary: StepStatus,
    release: StepStatus,
    tool_failed: bool,
    junit_report: Option<String>,
    artifacts: ArtifactDirectory,
}

/// Runs builds and tests against a container runtime.
pub struct Pipeline {
    runtime: Arc<dyn ContainerRuntime>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, settings: PipelineSettings) -> Self {
        Self { runtime, settings }
    }

    /// Settings in effect.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn exec_timeout(&self) -> Option<Duration> {
        self.settings.exec_timeout_secs.map(Duration::from_secs)
    }

    /// Execute one run and export its artifacts to `output_dir`.
    ///
    /// # Errors
    ///
    /// Input errors (invalid config, conflicting licenses, missing host files,
    /// unreadable version marker) are returned before any environment is
    /// created. Under the strict error policy a failing editor command is
    /// returned as `ToolFailed` after the license has been released.
    pub async fn run(&self, config: &RunConfig, output_dir: &Path) -> Result<RunReport> {
        config.validate()?;
        let credential = LicenseCredential::resolve(config)?;
        check_host_inputs(config)?;

        let workspace = prepare_workspace(&config.project_dir).await?;
        let project_version = resolve_project_version(workspace.path())?;
        let image = editor_image_reference(
            &self.settings.image_repository,
            &config.os,
            &project_version,
            &config.platform,
            &self.settings.toolchain_version,
        );

        info!(
            mode = config.mode.name(),
            image = %image,
            version = %project_version,
            license = ?credential.as_ref().map(LicenseCredential::kind),
            "starting run"
        );

        let spec = ContainerSpec {
            image: image.clone(),
            env: vec![(CACHE_BUSTER_ENV.to_string(), Utc::now().to_rfc3339())],
            cache_mounts: vec![CacheMount {
                volume: self.settings.cache_volume.clone(),
                target: LIBRARY_CACHE_PATH.to_string(),
            }],
        };
        let env = Environment::start(self.runtime.clone(), &spec, self.exec_timeout()).await?;

        let staged = self.run_stages(&env, config, credential.as_ref(), &workspace, output_dir).await;
        let output = with_cleanup(staged, env.destroy().await)?;

        Ok(RunReport {
            mode: config.mode.name(),
            image,
            project_version,
            license: credential.as_ref().map(LicenseCredential::kind),
            registration: output.registration,
            primary: output.primary,
            release: output.release,
            error_policy: self.settings.error_policy,
            tool_failed: output.tool_failed,
            junit_report: output.junit_report,
            artifacts: output.artifacts,
            workspace: workspace.stats().clone(),
        })
    }

    async fn run_stages(
        &self,
        env: &Environment,
        config: &RunConfig,
        credential: Option<&LicenseCredential>,
        workspace: &PreparedWorkspace,
        output_dir: &Path,
    ) -> Result<StageOutput> {
        info!(stage = "copy_workspace", container = %env.id(), "copying project");
        env.copy_in(workspace.path(), PROJECT_PATH).await?;

        let registration = match credential {
            Some(credential) => {
                info!(stage = "register_license", license = %credential.kind(), "registering license");
                Some(license::register(env, credential).await?)
            }
            None => {
                info!(stage = "register_license", "no license credential supplied");
                None
            }
        };

        info!(stage = "run_editor", mode = config.mode.name(), "running editor");
        let primary = runner::run_primary(env, config).await;

        info!(stage = "release_license", "releasing license");
        let release = license::release(env).await;

        let (primary, release) = match (primary, release) {
            (Ok(primary), Ok(release)) => (primary, release),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
            (Err(e), Err(release_err)) => {
                warn!(error = %release_err, "license release failed after editor error");
                return Err(e);
            }
        };

        let tool_failed = runner::check_outcome(&config.mode, &primary, self.settings.error_policy)?;

        let junit_report = match &config.mode {
            RunMode::Test {
                test_platform,
                junit_transform: Some(stylesheet),
            } => {
                info!(stage = "convert_report", test_platform = %test_platform, "converting test report");
                let path = converter::convert_report(
                    self.runtime.clone(),
                    env,
                    &self.settings.converter_image,
                    self.exec_timeout(),
                    test_platform,
                    stylesheet,
                )
                .await?;
                Some(path)
            }
            _ => None,
        };

        info!(stage = "export_artifacts", "exporting artifacts");
        let artifacts = artifacts::export_artifacts(env, &config.mode, output_dir).await?;

        Ok(StageOutput {
            registration,
            primary: StepStatus::from(&primary),
            release,
            tool_failed,
            junit_report,
            artifacts,
        })
    }
}

/// Check that every host file the run will copy exists.
fn check_host_inputs(config: &RunConfig) -> Result<()> {
    let mut inputs = vec![
        ("Personal license file", config.license_file.as_deref()),
        ("License server config", config.service_config.as_deref()),
    ];
    if let RunMode::Test { junit_transform, .. } = &config.mode {
        inputs.push(("JUnit stylesheet", junit_transform.as_deref()));
    }

    for (what, path) in inputs {
        if let Some(path) = path {
            ensure!(path.is_file(), HostFileNotFoundSnafu { what, path });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gameci_core::SecretRef;

    use super::*;
    use crate::error::ExecutorError;

    fn config(mode: RunMode) -> RunConfig {
        RunConfig {
            project_dir: PathBuf::from("/nonexistent/project"),
            user: "ci@example.com".into(),
            platform: "webgl".into(),
            build_target: "WebGL".into(),
            os: "ubuntu".into(),
            build_name: "game".into(),
            password: SecretRef::Env("UNITY_PASSWORD".into()),
            serial: None,
            license_file: None,
            service_config: None,
            mode,
        }
    }

    #[test]
    fn test_missing_stylesheet_is_reported() {
        let config = config(RunMode::Test {
            test_platform: "editmode".into(),
            junit_transform: Some(PathBuf::from("/nonexistent/nunit3-junit.xslt")),
        });
        let err = check_host_inputs(&config).unwrap_err();
        assert!(matches!(err, ExecutorError::HostFileNotFound { what: "JUnit stylesheet", .. }));
    }

    #[test]
    fn test_no_optional_inputs_is_fine() {
        assert!(check_host_inputs(&config(RunMode::Build)).is_ok());
    }

    #[test]
    fn test_step_status_from_outcome() {
        let outcome = ExecOutcome {
            exit_code: 4,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 12,
        };
        assert_eq!(StepStatus::from(&outcome), StepStatus {
            exit_code: 4,
            duration_ms: 12
        });
    }
}
