//! Command modules for gameci.
//!
//! `build` and `test` share their project, identity, and license arguments
//! and the execution path below; each adds only its run mode.

pub mod build;
pub mod test;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use gameci_core::PipelineSettings;
use gameci_core::RunConfig;
use gameci_core::RunMode;
use gameci_core::SecretRef;
use gameci_executor::DockerRuntime;
use gameci_executor::InMemoryRuntime;
use gameci_executor::Pipeline;
use tempfile::TempDir;
use tracing::info;

use crate::output::RunOutput;
use crate::output::print_output;

/// Resolved global state for one invocation.
pub struct Invocation {
    pub settings: PipelineSettings,
    pub is_dry_run: bool,
    pub is_json: bool,
}

/// Arguments shared by `build` and `test`.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Unity project directory.
    #[arg(long, env = "GAMECI_PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// Unity account used for license activation.
    #[arg(long, env = "GAMECI_USER")]
    pub user: String,

    /// Account password as a secret reference (`env:NAME` or `file:PATH`).
    #[arg(long, env = "GAMECI_PASSWORD")]
    pub password: SecretRef,

    /// Serial number as a secret reference, for serial licensing.
    #[arg(long, env = "GAMECI_SERIAL")]
    pub serial: Option<SecretRef>,

    /// Personal license file (`Unity_lic.ulf`).
    #[arg(long, env = "GAMECI_LICENSE_FILE")]
    pub license_file: Option<PathBuf>,

    /// Floating license server config (`services-config.json`).
    #[arg(long, env = "GAMECI_SERVICE_CONFIG")]
    pub service_config: Option<PathBuf>,

    /// Editor image platform module (e.g. `webgl`, `linux-il2cpp`, `android`).
    #[arg(long, env = "GAMECI_PLATFORM")]
    pub platform: String,

    /// Editor build target (e.g. `WebGL`, `StandaloneLinux64`).
    #[arg(long, env = "GAMECI_BUILD_TARGET")]
    pub build_target: String,

    /// Editor image operating system (e.g. `ubuntu`, `windows`).
    #[arg(long, env = "GAMECI_OS")]
    pub os: String,

    /// Name of the produced player.
    #[arg(long, env = "GAMECI_BUILD_NAME")]
    pub build_name: String,
}

impl RunArgs {
    /// Build the immutable run configuration.
    pub fn into_config(self, mode: RunMode) -> RunConfig {
        RunConfig {
            project_dir: self.project,
            user: self.user,
            platform: self.platform,
            build_target: self.build_target,
            os: self.os,
            build_name: self.build_name,
            password: self.password,
            serial: self.serial,
            license_file: self.license_file,
            service_config: self.service_config,
            mode,
        }
    }
}

/// Run the pipeline and print its report.
pub async fn execute(invocation: &Invocation, config: RunConfig) -> Result<()> {
    let settings = invocation.settings.clone();
    let mode = config.mode.name();

    let output = if invocation.is_dry_run {
        // Simulated artifacts go to a scratch directory, never the real output.
        let scratch = TempDir::with_prefix("gameci-dry-run-").context("failed to create scratch directory")?;
        let runtime = Arc::new(InMemoryRuntime::new());
        info!(mode, "dry run: using in-memory runtime");

        let report = Pipeline::new(runtime.clone(), settings)
            .run(&config, scratch.path())
            .await
            .with_context(|| format!("{mode} dry run failed"))?;

        RunOutput {
            report,
            events: Some(runtime.events().await),
        }
    } else {
        let output_dir = settings
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(config.mode.artifact_path().trim_start_matches('/')));
        let runtime = Arc::new(DockerRuntime::new(settings.container_binary.clone()));

        let report = Pipeline::new(runtime, settings).run(&config, &output_dir).await.with_context(|| format!("{mode} failed"))?;

        RunOutput { report, events: None }
    };

    print_output(&output, invocation.is_json);
    Ok(())
}
