//! Output formatting for CLI responses.
//!
//! Supports both human-readable and JSON output formats for
//! integration with scripts and other tools.

use gameci_executor::RunReport;
use gameci_executor::RuntimeEvent;
use gameci_executor::StepStatus;

/// Trait for types that can be output in multiple formats.
pub trait Outputable {
    /// Convert to JSON value for structured output.
    fn to_json(&self) -> serde_json::Value;

    /// Convert to human-readable string.
    fn to_human(&self) -> String;
}

/// Print a value in the appropriate format.
pub fn print_output<T: Outputable>(value: &T, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&value.to_json())
                .unwrap_or_else(|e| { format!("{{\"error\": \"failed to serialize: {}\"}}", e) })
        );
    } else {
        println!("{}", value.to_human());
    }
}

/// A finished run, plus the recorded operations of a dry run.
pub struct RunOutput {
    pub report: RunReport,
    pub events: Option<Vec<RuntimeEvent>>,
}

fn status(step: &StepStatus) -> String {
    format!("exit {} ({} ms)", step.exit_code, step.duration_ms)
}

fn describe(event: &RuntimeEvent) -> String {
    match event {
        RuntimeEvent::Create { id, image, .. } => format!("{id}: create from {image}"),
        RuntimeEvent::CopyIn {
            id,
            container_path,
            files,
        } if files.is_empty() => format!("{id}: copy file to {container_path}"),
        RuntimeEvent::CopyIn {
            id,
            container_path,
            files,
        } => format!("{id}: copy {} files to {container_path}", files.len()),
        RuntimeEvent::Exec { id, argv, .. } => format!("{id}: exec {}", argv.join(" ")),
        RuntimeEvent::CopyOut { id, container_path, .. } => format!("{id}: export {container_path}"),
        RuntimeEvent::Remove { id } => format!("{id}: remove"),
    }
}

impl Outputable for RunOutput {
    fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.report).unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
        if let Some(events) = &self.events
            && let Some(object) = value.as_object_mut()
        {
            object.insert("dry_run".to_string(), serde_json::Value::Bool(true));
            object.insert("operations".to_string(), serde_json::to_value(events).unwrap_or_default());
        }
        value
    }

    fn to_human(&self) -> String {
        let report = &self.report;
        let outcome = if report.tool_failed { "finished with editor failure" } else { "succeeded" };
        let title = format!("{} {}", capitalize(report.mode), outcome);

        let license = match (&report.license, &report.registration) {
            (Some(kind), Some(step)) => format!("{kind} ({})", status(step)),
            (Some(kind), None) => kind.to_string(),
            (None, _) => "none".to_string(),
        };

        let artifacts = if self.events.is_some() {
            format!("{} (dry run, not exported)", report.artifacts.container_path)
        } else {
            format!("{} -> {}", report.artifacts.container_path, report.artifacts.host_path.display())
        };

        let mut out = format!(
            "{title}\n\
             {underline}\n\
             Image:          {}\n\
             Version:        {}\n\
             License:        {}\n\
             Editor:         {}\n\
             License return: {}\n\
             Artifacts:      {}",
            report.image,
            report.project_version,
            license,
            status(&report.primary),
            status(&report.release),
            artifacts,
            underline = "=".repeat(title.len()),
        );

        if let Some(junit) = &report.junit_report {
            out.push_str(&format!("\nJUnit report:   {junit}"));
        }

        if let Some(events) = &self.events {
            out.push_str("\n\nOperations:");
            for event in events {
                out.push_str(&format!("\n  {}", describe(event)));
            }
        }

        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gameci_core::ErrorPolicy;
    use gameci_core::LicenseKind;
    use gameci_executor::ArtifactDirectory;
    use gameci_executor::StageStats;

    use super::*;

    fn report() -> RunReport {
        RunReport {
            mode: "build",
            image: "unityci/editor:ubuntu-2021.3.5f1-webgl-3.1.0".into(),
            project_version: "2021.3.5f1".into(),
            license: Some(LicenseKind::Serial),
            registration: Some(StepStatus {
                exit_code: 0,
                duration_ms: 10,
            }),
            primary: StepStatus {
                exit_code: 0,
                duration_ms: 1000,
            },
            release: StepStatus {
                exit_code: 1,
                duration_ms: 5,
            },
            error_policy: ErrorPolicy::Strict,
            tool_failed: false,
            junit_report: None,
            artifacts: ArtifactDirectory {
                container_path: "/builds".into(),
                host_path: PathBuf::from("builds"),
            },
            workspace: StageStats::default(),
        }
    }

    #[test]
    fn test_human_output() {
        let output = RunOutput {
            report: report(),
            events: None,
        };
        let text = output.to_human();
        assert!(text.starts_with("Build succeeded\n==============="));
        assert!(text.contains("License:        serial (exit 0 (10 ms))"));
        assert!(text.contains("License return: exit 1 (5 ms)"));
        assert!(text.contains("/builds -> builds"));
    }

    #[test]
    fn test_json_output_marks_dry_run() {
        let output = RunOutput {
            report: report(),
            events: Some(vec![RuntimeEvent::Remove { id: "mem-1".into() }]),
        };
        let json = output.to_json();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["license"], "serial");
        assert_eq!(json["operations"][0]["op"], "remove");
        assert!(output.to_human().contains("mem-1: remove"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("test"), "Test");
        assert_eq!(capitalize(""), "");
    }
}
