//! NUnit to JUnit report conversion.
//!
//! Conversion happens in a disposable secondary environment so the editor
//! image does not need an XSLT processor. The results file travels host-side
//! through a scratch directory in both directions.

use std::path::Path;
use std::sync::Arc;

use gameci_core::constants::JUNIT_TRANSFORM_PATH;
use gameci_core::verified::junit_results_file;
use gameci_core::verified::junit_transform_command;
use gameci_core::verified::results_file;
use gameci_core::verified::xslt_install_commands;
use snafu::ResultExt;
use tempfile::TempDir;
use tracing::info;

use crate::environment::Environment;
use crate::environment::with_cleanup;
use crate::error::CreateScratchSnafu;
use crate::error::Result;
use crate::runtime::ContainerRuntime;
use crate::runtime::ContainerSpec;
use crate::runtime::ExitPolicy;

/// Convert the test results in `main` and place the JUnit file next to them.
///
/// Returns the JUnit path inside `main`. Every converter command must exit
/// zero. The converter environment is removed whether or not conversion
/// succeeded.
pub(crate) async fn convert_report(
    runtime: Arc<dyn ContainerRuntime>,
    main: &Environment,
    converter_image: &str,
    exec_timeout: Option<std::time::Duration>,
    test_platform: &str,
    stylesheet: &Path,
) -> Result<String> {
    let scratch = TempDir::with_prefix("gameci-report-").context(CreateScratchSnafu)?;
    let nunit_host = scratch.path().join("results.xml");
    let junit_host = scratch.path().join("junit-results.xml");

    let nunit_path = results_file(test_platform);
    let junit_path = junit_results_file(test_platform);

    main.export_file(&nunit_path, &nunit_host).await?;

    let spec = ContainerSpec {
        image: converter_image.to_string(),
        ..Default::default()
    };
    let converter = Environment::start(runtime, &spec, exec_timeout).await?;
    let converted = transform(&converter, &nunit_host, &nunit_path, stylesheet, test_platform, &junit_path, &junit_host).await;
    with_cleanup(converted, converter.destroy().await)?;

    main.copy_in(&junit_host, &junit_path).await?;
    info!(test_platform, path = %junit_path, "test report converted");
    Ok(junit_path)
}

async fn transform(
    converter: &Environment,
    nunit_host: &Path,
    nunit_path: &str,
    stylesheet: &Path,
    test_platform: &str,
    junit_path: &str,
    junit_host: &Path,
) -> Result<()> {
    for argv in xslt_install_commands() {
        converter.exec(argv, ExitPolicy::Success).await?;
    }
    converter.copy_in(nunit_host, nunit_path).await?;
    converter.copy_in(stylesheet, JUNIT_TRANSFORM_PATH).await?;
    converter.exec(junit_transform_command(test_platform), ExitPolicy::Success).await?;
    converter.export_file(junit_path, junit_host).await
}
