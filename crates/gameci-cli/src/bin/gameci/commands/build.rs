//! Player build command.

use anyhow::Result;
use clap::Args;
use gameci_core::RunMode;

use super::Invocation;
use super::RunArgs;
use super::execute;

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

impl BuildArgs {
    /// Execute the build.
    pub async fn run(self, invocation: &Invocation) -> Result<()> {
        execute(invocation, self.run.into_config(RunMode::Build)).await
    }
}
