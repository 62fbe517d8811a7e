//! CLI argument parsing and command dispatch.
//!
//! Uses clap derive macros for declarative argument definition with
//! support for environment variables and global options.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use gameci_core::ErrorPolicy;
use gameci_core::PipelineSettings;
use gameci_core::SettingsOverlay;

use crate::commands::Invocation;
use crate::commands::build::BuildArgs;
use crate::commands::test::TestArgs;

/// Command-line interface for gameci.
#[derive(Parser)]
#[command(name = "gameci")]
#[command(version)]
#[command(about = "Build and test Unity projects in disposable containers")]
#[command(long_about = "Runs the Unity editor inside a versioned editor image, handles license \
    activation and release, converts test reports to JUnit, and exports the build or test output.")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global options available to all commands.
#[derive(Args, Clone)]
pub struct GlobalOptions {
    /// Settings file (TOML).
    #[arg(long, env = "GAMECI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Container CLI to use (`docker`, `podman`, ...).
    #[arg(long, global = true)]
    pub container_binary: Option<String>,

    /// How a failing editor command affects the run: strict or tolerant.
    #[arg(long, global = true)]
    pub error_policy: Option<ErrorPolicy>,

    /// Host directory for exported artifacts.
    ///
    /// Defaults to ./builds or ./results depending on the command.
    #[arg(short = 'o', long = "output", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Kill any single container command after this many seconds.
    #[arg(long, global = true)]
    pub exec_timeout_secs: Option<u64>,

    /// Run the pipeline against an in-memory runtime and report what would run.
    #[arg(long = "dry-run", global = true)]
    pub is_dry_run: bool,

    /// Output JSON instead of human-readable format.
    #[arg(long = "json", global = true)]
    pub is_json: bool,

    /// Enable verbose logging.
    #[arg(short = 'v', long = "verbose", global = true)]
    pub is_verbose: bool,

    /// Suppress all logging output (warnings, debug messages).
    ///
    /// Useful for scripting and when parsing JSON output.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub is_quiet: bool,
}

impl GlobalOptions {
    /// Layer command-line overrides on top of file and environment settings.
    ///
    /// Validation runs once over the final result, so a flag can correct an
    /// invalid file or environment value.
    pub fn settings(&self) -> Result<PipelineSettings> {
        let overrides = SettingsOverlay {
            container_binary: self.container_binary.clone(),
            error_policy: self.error_policy,
            output_dir: self.output_dir.clone(),
            exec_timeout_secs: self.exec_timeout_secs,
            ..Default::default()
        };
        PipelineSettings::load(self.config.as_deref(), overrides).context("failed to load settings")
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Build a player.
    ///
    /// Exports the build directory (player and editor log) on success.
    Build(BuildArgs),

    /// Run the test suite for one test platform.
    ///
    /// Exports the results directory (NUnit results, coverage, editor log and,
    /// with --junit-transform, a JUnit report).
    Test(TestArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn run(self) -> Result<()> {
        let invocation = Invocation {
            settings: self.global.settings()?,
            is_dry_run: self.global.is_dry_run,
            is_json: self.global.is_json,
        };

        match self.command {
            Commands::Build(args) => args.run(&invocation).await,
            Commands::Test(args) => args.run(&invocation).await,
        }
    }
}
