//! License credential selection.
//!
//! A run activates at most one license. Which one is decided by the optional
//! inputs that were supplied, and the decision is made once, before any
//! environment exists.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::CoreError;
use crate::error::Result;
use crate::secret::SecretRef;

/// Variant names in evaluation order.
const PERSONAL: &str = "personal license file";
const SERIAL: &str = "serial number";
const SERVER: &str = "license server config";

/// The license activation strategy for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseCredential {
    /// Personal license file plus account login.
    Personal {
        /// License file on the host.
        license_file: PathBuf,
        /// Account name.
        user: String,
        /// Account password.
        password: SecretRef,
    },
    /// Serial number plus account login.
    Serial {
        /// Account name.
        user: String,
        /// Account password.
        password: SecretRef,
        /// Serial number.
        serial: SecretRef,
    },
    /// Floating license acquired from a license server.
    Server {
        /// Service configuration on the host.
        service_config: PathBuf,
    },
}

/// Tag of a [`LicenseCredential`], safe to log and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseKind {
    /// Personal license file.
    Personal,
    /// Serial number.
    Serial,
    /// Floating license server.
    Server,
}

impl fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseKind::Personal => f.write_str("personal"),
            LicenseKind::Serial => f.write_str("serial"),
            LicenseKind::Server => f.write_str("server"),
        }
    }
}

impl LicenseCredential {
    /// Select the credential for a run.
    ///
    /// Returns `Ok(None)` when no license input was supplied.
    ///
    /// # Errors
    ///
    /// `CoreError::ConflictingLicenses` when more than one of the personal
    /// license file, serial number, and license server config is supplied.
    pub fn resolve(config: &RunConfig) -> Result<Option<Self>> {
        let mut candidates = Vec::with_capacity(3);

        if let Some(license_file) = &config.license_file {
            candidates.push((PERSONAL, LicenseCredential::Personal {
                license_file: license_file.clone(),
                user: config.user.clone(),
                password: config.password.clone(),
            }));
        }
        if let Some(serial) = &config.serial {
            candidates.push((SERIAL, LicenseCredential::Serial {
                user: config.user.clone(),
                password: config.password.clone(),
                serial: serial.clone(),
            }));
        }
        if let Some(service_config) = &config.service_config {
            candidates.push((SERVER, LicenseCredential::Server {
                service_config: service_config.clone(),
            }));
        }

        if candidates.len() > 1 {
            return Err(CoreError::ConflictingLicenses {
                supplied: candidates.iter().map(|(name, _)| *name).collect(),
            });
        }

        Ok(candidates.pop().map(|(_, credential)| credential))
    }

    /// The variant tag.
    pub fn kind(&self) -> LicenseKind {
        match self {
            LicenseCredential::Personal { .. } => LicenseKind::Personal,
            LicenseCredential::Serial { .. } => LicenseKind::Serial,
            LicenseCredential::Server { .. } => LicenseKind::Server,
        }
    }
}
