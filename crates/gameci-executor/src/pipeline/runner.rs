//! Primary editor command and the error check that follows it.

use gameci_core::ErrorPolicy;
use gameci_core::RunConfig;
use gameci_core::RunMode;
use gameci_core::verified::build_command;
use gameci_core::verified::test_command;
use tracing::info;
use tracing::warn;

use crate::environment::Environment;
use crate::error::Result;
use crate::error::ToolFailedSnafu;
use crate::runtime::ExecOutcome;
use crate::runtime::ExitPolicy;

/// Editor arguments for the run's mode.
pub(crate) fn primary_command(config: &RunConfig) -> Vec<String> {
    match &config.mode {
        RunMode::Build => build_command(&config.build_target, &config.build_name),
        RunMode::Test { test_platform, .. } => test_command(test_platform),
    }
}

/// Run the build or test command.
///
/// The exit status is captured rather than raised; see [`check_outcome`].
pub(crate) async fn run_primary(env: &Environment, config: &RunConfig) -> Result<ExecOutcome> {
    let outcome = env.exec(primary_command(config), ExitPolicy::Any).await?;
    info!(
        mode = config.mode.name(),
        exit_code = outcome.exit_code,
        duration_ms = outcome.duration_ms,
        "editor command finished"
    );
    Ok(outcome)
}

/// Apply the error policy to the primary command's outcome.
///
/// Returns whether the editor failed, for reporting under the tolerant policy.
pub(crate) fn check_outcome(mode: &RunMode, outcome: &ExecOutcome, policy: ErrorPolicy) -> Result<bool> {
    if outcome.is_success() {
        return Ok(false);
    }

    match policy {
        ErrorPolicy::Strict => ToolFailedSnafu {
            mode: mode.name(),
            exit_code: outcome.exit_code,
            stderr_tail: outcome.stderr.clone(),
            stdout_tail: outcome.stdout.clone(),
        }
        .fail(),
        ErrorPolicy::Tolerant => {
            warn!(mode = mode.name(), exit_code = outcome.exit_code, "editor command failed, continuing (tolerant policy)");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;

    fn outcome(exit_code: i32) -> ExecOutcome {
        ExecOutcome {
            exit_code,
            stdout: "out".into(),
            stderr: "err".into(),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_success_passes_both_policies() {
        assert!(!check_outcome(&RunMode::Build, &outcome(0), ErrorPolicy::Strict).unwrap());
        assert!(!check_outcome(&RunMode::Build, &outcome(0), ErrorPolicy::Tolerant).unwrap());
    }

    #[test]
    fn test_strict_raises_tool_failed() {
        let err = check_outcome(&RunMode::Build, &outcome(3), ErrorPolicy::Strict).unwrap_err();
        match err {
            ExecutorError::ToolFailed {
                mode,
                exit_code,
                stderr_tail,
                ..
            } => {
                assert_eq!(mode, "build");
                assert_eq!(exit_code, 3);
                assert_eq!(stderr_tail, "err");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tolerant_reports_failure() {
        let mode = RunMode::Test {
            test_platform: "editmode".into(),
            junit_transform: None,
        };
        assert!(check_outcome(&mode, &outcome(2), ErrorPolicy::Tolerant).unwrap());
    }
}
