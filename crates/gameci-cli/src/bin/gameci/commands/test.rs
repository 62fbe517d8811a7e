//! Test suite command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gameci_core::RunMode;

use super::Invocation;
use super::RunArgs;
use super::execute;

#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Editor test platform (`editmode`, `playmode`, or a player target).
    #[arg(long, env = "GAMECI_TEST_PLATFORM")]
    pub test_platform: String,

    /// XSLT stylesheet converting NUnit results to JUnit.
    ///
    /// Without it no JUnit report is produced.
    #[arg(long, env = "GAMECI_JUNIT_TRANSFORM")]
    pub junit_transform: Option<PathBuf>,
}

impl TestArgs {
    /// Execute the test run.
    pub async fn run(self, invocation: &Invocation) -> Result<()> {
        let mode = RunMode::Test {
            test_platform: self.test_platform,
            junit_transform: self.junit_transform,
        };
        execute(invocation, self.run.into_config(mode)).await
    }
}
