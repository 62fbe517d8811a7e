//! End-to-end tests of the `gameci` binary in dry-run mode.
//!
//! Dry runs drive the full pipeline against the in-memory runtime, so these
//! tests need no container engine.

use std::path::Path;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

fn project(root: &Path) -> std::path::PathBuf {
    let project = root.join("project");
    std::fs::create_dir_all(project.join("ProjectSettings")).unwrap();
    std::fs::write(project.join("ProjectSettings/ProjectVersion.txt"), "m_EditorVersion: 2022.3.10f1\n").unwrap();
    std::fs::create_dir_all(project.join("Assets")).unwrap();
    std::fs::write(project.join("Assets/Game.cs"), "class Game {}").unwrap();
    project
}

fn gameci(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gameci"))
        .args(args)
        .env("GAMECI_TEST_PASSWORD", "hunter2")
        .env_remove("GAMECI_CONFIG")
        .env_remove("GAMECI_ERROR_POLICY")
        .output()
        .unwrap()
}

fn run_args<'a>(project: &'a str) -> Vec<&'a str> {
    vec![
        "--project",
        project,
        "--user",
        "ci@example.com",
        "--password",
        "env:GAMECI_TEST_PASSWORD",
        "--platform",
        "webgl",
        "--build-target",
        "WebGL",
        "--os",
        "ubuntu",
        "--build-name",
        "game",
    ]
}

#[test]
fn test_dry_run_build_reports_json() {
    let root = TempDir::new().unwrap();
    let project = project(root.path());
    let serial = root.path().join("serial");
    std::fs::write(&serial, "SB-0000").unwrap();
    let serial_ref = format!("file:{}", serial.display());

    let mut args = vec!["--dry-run", "--json", "-q", "build"];
    let project_str = project.to_str().unwrap();
    args.extend(run_args(project_str));
    args.extend(["--serial", serial_ref.as_str()]);

    let output = gameci(&args);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("hunter2"));
    assert!(!stdout.contains("SB-0000"));

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["mode"], "build");
    assert_eq!(json["image"], "unityci/editor:ubuntu-2022.3.10f1-webgl-3.1.0");
    assert_eq!(json["license"], "serial");
    assert_eq!(json["artifacts"]["container_path"], "/builds");
}

#[test]
fn test_dry_run_test_with_transform() {
    let root = TempDir::new().unwrap();
    let project = project(root.path());
    let stylesheet = root.path().join("nunit3-junit.xslt");
    std::fs::write(&stylesheet, "<xsl:stylesheet/>").unwrap();

    let mut args = vec!["--dry-run", "--json", "-q", "test"];
    let project_str = project.to_str().unwrap();
    args.extend(run_args(project_str));
    args.extend(["--test-platform", "editmode", "--junit-transform", stylesheet.to_str().unwrap()]);

    let output = gameci(&args);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "test");
    assert_eq!(json["junit_report"], "/results/editmode-junit-results.xml");
    assert_eq!(json["artifacts"]["container_path"], "/results");
}

#[test]
fn test_conflicting_licenses_exit_nonzero() {
    let root = TempDir::new().unwrap();
    let project = project(root.path());
    let ulf = root.path().join("Unity_lic.ulf");
    let services = root.path().join("services-config.json");
    std::fs::write(&ulf, "<License/>").unwrap();
    std::fs::write(&services, "{}").unwrap();

    let mut args = vec!["--dry-run", "build"];
    let project_str = project.to_str().unwrap();
    args.extend(run_args(project_str));
    args.extend(["--license-file", ulf.to_str().unwrap(), "--service-config", services.to_str().unwrap()]);

    let output = gameci(&args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("personal license file"), "stderr: {stderr}");
    assert!(stderr.contains("license server config"), "stderr: {stderr}");
}

#[test]
fn test_missing_required_argument_fails() {
    let output = gameci(&["build", "--user", "ci@example.com"]);
    assert!(!output.status.success());
}
