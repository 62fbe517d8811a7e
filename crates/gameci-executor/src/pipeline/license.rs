//! License registration and release.

use gameci_core::LicenseCredential;
use gameci_core::constants::PERSONAL_LICENSE_PATH;
use gameci_core::constants::SERVICE_CONFIG_PATH;
use gameci_core::verified::floating_license_command;
use gameci_core::verified::personal_license_command;
use gameci_core::verified::return_license_command;
use gameci_core::verified::serial_license_command;
use tracing::info;
use tracing::warn;

use super::StepStatus;
use crate::environment::Environment;
use crate::error::Result;
use crate::runtime::ExitPolicy;

/// Activate `credential` inside `env`.
///
/// Secrets are resolved immediately before the command that uses them, so a
/// resolution failure aborts before anything runs. The activation exit
/// status is logged and returned but never fails the run.
pub(crate) async fn register(env: &Environment, credential: &LicenseCredential) -> Result<StepStatus> {
    let argv = match credential {
        LicenseCredential::Personal {
            license_file,
            user,
            password,
        } => {
            let password = password.resolve()?;
            env.copy_in(license_file, PERSONAL_LICENSE_PATH).await?;
            personal_license_command(user, password.expose())
        }
        LicenseCredential::Serial { user, password, serial } => {
            let password = password.resolve()?;
            let serial = serial.resolve()?;
            serial_license_command(user, password.expose(), serial.expose())
        }
        LicenseCredential::Server { service_config } => {
            env.copy_in(service_config, SERVICE_CONFIG_PATH).await?;
            floating_license_command()
        }
    };

    let outcome = env.exec(argv, ExitPolicy::Any).await?;
    let status = StepStatus::from(&outcome);
    if outcome.is_success() {
        info!(license = %credential.kind(), duration_ms = status.duration_ms, "license registered");
    } else {
        warn!(license = %credential.kind(), exit_code = status.exit_code, "license registration exited non-zero");
    }
    Ok(status)
}

/// Return the active license.
pub(crate) async fn release(env: &Environment) -> Result<StepStatus> {
    let outcome = env.exec(return_license_command(), ExitPolicy::Any).await?;
    let status = StepStatus::from(&outcome);
    if outcome.is_success() {
        info!(duration_ms = status.duration_ms, "license released");
    } else {
        warn!(exit_code = status.exit_code, "license release exited non-zero");
    }
    Ok(status)
}
