//! Editor, licensing, and converter argument vectors.
//!
//! Every command that runs inside an environment is assembled here. The
//! returned vectors are passed to the container runtime verbatim.

use crate::constants::BUILD_ENTRY_POINT;
use crate::constants::BUILDS_PATH;
use crate::constants::COVERAGE_OPTIONS;
use crate::constants::JUNIT_TRANSFORM_PATH;
use crate::constants::LICENSING_CLIENT_PATH;
use crate::constants::PROJECT_PATH;
use crate::constants::REDACTED;
use crate::constants::RESULTS_PATH;
use crate::constants::XSLT_PACKAGE;

/// Flags whose following argument is a secret.
const SECRET_FLAGS: &[&str] = &["-password", "-serial"];

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Editor invocation shared by every editor command.
///
/// Wraps the editor in a virtual display and points it at the project root.
pub fn base_command() -> Vec<String> {
    strings(&[
        "xvfb-run",
        "--auto-servernum",
        "--server-args='-screen 0 640x480x24'",
        "unity-editor",
        "-nographics",
        "-projectPath",
        PROJECT_PATH,
    ])
}

/// Build log location.
pub fn build_log_file() -> String {
    format!("{BUILDS_PATH}/unity.log")
}

/// Test log location.
pub fn test_log_file() -> String {
    format!("{RESULTS_PATH}/unity.log")
}

/// NUnit results file for a test platform.
pub fn results_file(test_platform: &str) -> String {
    format!("{RESULTS_PATH}/{test_platform}-results.xml")
}

/// JUnit results file for a test platform.
pub fn junit_results_file(test_platform: &str) -> String {
    format!("{RESULTS_PATH}/{test_platform}-junit-results.xml")
}

/// Coverage output directory for a test platform.
pub fn coverage_results_dir(test_platform: &str) -> String {
    format!("{RESULTS_PATH}/{test_platform}-coverage/")
}

/// Coverage history directory for a test platform.
pub fn coverage_history_dir(test_platform: &str) -> String {
    format!("{RESULTS_PATH}/{test_platform}-coverage-history/")
}

/// Editor command that performs a build.
///
/// # Example
///
/// ```
/// use gameci_core::verified::build_command;
///
/// let cmd = build_command("StandaloneLinux64", "game");
/// assert_eq!(cmd[0], "xvfb-run");
/// assert!(cmd.windows(2).any(|w| w[0] == "-customBuildName" && w[1] == "game"));
/// ```
pub fn build_command(build_target: &str, build_name: &str) -> Vec<String> {
    let mut cmd = base_command();
    cmd.extend([
        "-buildTarget".to_string(),
        build_target.to_string(),
        "-customBuildPath".to_string(),
        format!("{BUILDS_PATH}/"),
        "-customBuildName".to_string(),
        build_name.to_string(),
        "-customBuildTarget".to_string(),
        build_target.to_string(),
        "-quit".to_string(),
        "-executeMethod".to_string(),
        BUILD_ENTRY_POINT.to_string(),
        "-logFile".to_string(),
        build_log_file(),
    ]);
    cmd
}

/// Editor command that runs the test suite for one test platform.
pub fn test_command(test_platform: &str) -> Vec<String> {
    let mut cmd = base_command();
    cmd.extend([
        "-runTests".to_string(),
        "-testResults".to_string(),
        results_file(test_platform),
        "-debugCodeOptimization".to_string(),
        "-enableCodeCoverage".to_string(),
        "-coverageResultsPath".to_string(),
        coverage_results_dir(test_platform),
        "-coverageHistoryPath".to_string(),
        coverage_history_dir(test_platform),
        "-testPlatform".to_string(),
        test_platform.to_string(),
        "-coverageOptions".to_string(),
        COVERAGE_OPTIONS.to_string(),
        "-logFile".to_string(),
        test_log_file(),
    ]);
    cmd
}

/// Editor command that returns the active license.
pub fn return_license_command() -> Vec<String> {
    let mut cmd = base_command();
    cmd.push("-returnlicense".to_string());
    cmd
}

/// Editor command that activates a personal license.
pub fn personal_license_command(user: &str, password: &str) -> Vec<String> {
    let mut cmd = base_command();
    cmd.extend(["-username".to_string(), user.to_string(), "-password".to_string(), password.to_string()]);
    cmd
}

/// Editor command that activates a serial-number license.
pub fn serial_license_command(user: &str, password: &str, serial: &str) -> Vec<String> {
    let mut cmd = personal_license_command(user, password);
    cmd.extend(["-serial".to_string(), serial.to_string()]);
    cmd
}

/// Licensing client command that acquires a floating license.
pub fn floating_license_command() -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        format!("{LICENSING_CLIENT_PATH} --acquire-floating"),
    ]
}

/// Package installation steps for the report converter environment.
pub fn xslt_install_commands() -> Vec<Vec<String>> {
    vec![strings(&["apt-get", "update"]), strings(&["apt-get", "install", "-y", XSLT_PACKAGE])]
}

/// Shell pipeline that applies the JUnit stylesheet to a results file.
pub fn junit_transform_command(test_platform: &str) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        format!(
            "saxonb-xslt -s {} -xsl {} > {}",
            results_file(test_platform),
            JUNIT_TRANSFORM_PATH,
            junit_results_file(test_platform)
        ),
    ]
}

/// Replace the values following secret-bearing flags with a placeholder.
///
/// # Example
///
/// ```
/// use gameci_core::verified::redact_args;
///
/// let argv = vec!["-username".to_string(), "me".to_string(), "-password".to_string(), "hunter2".to_string()];
/// assert_eq!(redact_args(&argv), vec!["-username", "me", "-password", "***"]);
/// ```
pub fn redact_args(argv: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(argv.len());
    let mut hide_next = false;
    for arg in argv {
        if hide_next {
            redacted.push(REDACTED.to_string());
            hide_next = false;
            continue;
        }
        hide_next = SECRET_FLAGS.contains(&arg.as_str());
        redacted.push(arg.clone());
    }
    redacted
}

/// Check that a value can be embedded in a path and a shell pipeline.
///
/// Accepts non-empty ASCII alphanumerics plus `-`, `_` and `.`, and rejects
/// `.` and `..`.
pub fn is_safe_path_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
