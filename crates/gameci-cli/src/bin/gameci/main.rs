//! gameci - build and test Unity projects in disposable containers.
//!
//! # Usage
//!
//! ```bash
//! # Build a WebGL player with a serial license
//! gameci build --project . --user ci@example.com --password env:UNITY_PASSWORD \
//!     --serial env:UNITY_SERIAL --platform webgl --build-target WebGL \
//!     --os ubuntu --build-name game
//!
//! # Run edit-mode tests and convert the report to JUnit
//! gameci test --project . --user ci@example.com --password file:/run/secrets/pw \
//!     --license-file Unity_lic.ulf --platform linux-il2cpp \
//!     --build-target StandaloneLinux64 --os ubuntu --build-name game \
//!     --test-platform editmode --junit-transform nunit3-junit.xslt
//!
//! # Show what would run, as JSON
//! gameci --dry-run --json build ...
//! ```

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with environment-based filtering.
///
/// - `quiet`: Suppress all logging output (for scripting)
/// - `verbose`: Enable debug-level logging, including streamed editor output
fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).compact().init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.global.is_quiet, cli.global.is_verbose);

    cli.run().await
}
