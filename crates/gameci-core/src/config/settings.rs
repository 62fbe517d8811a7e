//! Pipeline settings.
//!
//! Settings are layered with the following precedence (lowest to highest):
//! 1. Built-in defaults
//! 2. TOML settings file
//! 3. `GAMECI_*` environment variables
//! 4. Command-line flags (applied by the CLI)

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use snafu::OptionExt;
use snafu::ResultExt;
use snafu::ensure;

use crate::config::types::ErrorPolicy;
use crate::constants::DEFAULT_CACHE_VOLUME;
use crate::constants::DEFAULT_CONTAINER_BINARY;
use crate::constants::DEFAULT_CONVERTER_IMAGE;
use crate::constants::DEFAULT_IMAGE_REPOSITORY;
use crate::constants::DEFAULT_TOOLCHAIN_VERSION;
use crate::constants::MAX_EXEC_TIMEOUT_SECS;
use crate::constants::MAX_SETTINGS_FILE_BYTES;
use crate::error::CoreError;
use crate::error::InvalidSettingsSnafu;
use crate::error::ParseSettingsSnafu;
use crate::error::ReadSettingsSnafu;
use crate::error::Result;

/// Settings shared by every run on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Editor image repository.
    pub image_repository: String,

    /// Toolchain suffix of the editor image tag.
    pub toolchain_version: String,

    /// Name of the persistent library cache volume.
    pub cache_volume: String,

    /// Base image of the report converter environment.
    pub converter_image: String,

    /// Container CLI (`docker` or a compatible binary such as `podman`).
    pub container_binary: String,

    /// Per-command timeout inside an environment. `None` waits indefinitely.
    pub exec_timeout_secs: Option<u64>,

    /// Whether a failing editor command fails the run.
    pub error_policy: ErrorPolicy,

    /// Host directory receiving exported artifacts.
    /// Defaults to `./builds` or `./results` depending on the mode.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            image_repository: DEFAULT_IMAGE_REPOSITORY.to_string(),
            toolchain_version: DEFAULT_TOOLCHAIN_VERSION.to_string(),
            cache_volume: DEFAULT_CACHE_VOLUME.to_string(),
            converter_image: DEFAULT_CONVERTER_IMAGE.to_string(),
            container_binary: DEFAULT_CONTAINER_BINARY.to_string(),
            exec_timeout_secs: None,
            error_policy: ErrorPolicy::default(),
            output_dir: None,
        }
    }
}

/// A partial layer of settings.
///
/// Only the fields a source actually supplies are `Some`, so a layer can set
/// a field back to its built-in default over a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverlay {
    /// See [`PipelineSettings::image_repository`].
    pub image_repository: Option<String>,
    /// See [`PipelineSettings::toolchain_version`].
    pub toolchain_version: Option<String>,
    /// See [`PipelineSettings::cache_volume`].
    pub cache_volume: Option<String>,
    /// See [`PipelineSettings::converter_image`].
    pub converter_image: Option<String>,
    /// See [`PipelineSettings::container_binary`].
    pub container_binary: Option<String>,
    /// See [`PipelineSettings::exec_timeout_secs`].
    pub exec_timeout_secs: Option<u64>,
    /// See [`PipelineSettings::error_policy`].
    pub error_policy: Option<ErrorPolicy>,
    /// See [`PipelineSettings::output_dir`].
    pub output_dir: Option<PathBuf>,
}

impl SettingsOverlay {
    /// Parse a TOML settings file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path).context(ReadSettingsSnafu { path })?.len();
        ensure!(
            size <= MAX_SETTINGS_FILE_BYTES,
            InvalidSettingsSnafu {
                reason: format!(
                    "settings file {} too large: {} bytes (max: {})",
                    path.display(),
                    size,
                    MAX_SETTINGS_FILE_BYTES
                ),
            }
        );
        let content = std::fs::read_to_string(path).context(ReadSettingsSnafu { path })?;
        toml::from_str(&content).context(ParseSettingsSnafu { path })
    }

    /// Read `GAMECI_<FIELD_NAME>` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// A variable that is set but does not parse is an error naming it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let exec_timeout_secs = match lookup("GAMECI_EXEC_TIMEOUT_SECS") {
            Some(value) => Some(value.trim().parse::<u64>().ok().context(InvalidSettingsSnafu {
                reason: format!("GAMECI_EXEC_TIMEOUT_SECS must be a number of seconds, got {value:?}"),
            })?),
            None => None,
        };
        let error_policy = match lookup("GAMECI_ERROR_POLICY") {
            Some(value) => Some(
                value.parse::<ErrorPolicy>().map_err(|reason| CoreError::InvalidSettings {
                    reason: format!("GAMECI_ERROR_POLICY: {reason}"),
                })?,
            ),
            None => None,
        };

        Ok(Self {
            image_repository: lookup("GAMECI_IMAGE_REPOSITORY"),
            toolchain_version: lookup("GAMECI_TOOLCHAIN_VERSION"),
            cache_volume: lookup("GAMECI_CACHE_VOLUME"),
            converter_image: lookup("GAMECI_CONVERTER_IMAGE"),
            container_binary: lookup("GAMECI_CONTAINER_BINARY"),
            exec_timeout_secs,
            error_policy,
            output_dir: lookup("GAMECI_OUTPUT_DIR").map(PathBuf::from),
        })
    }
}

impl PipelineSettings {
    /// Load settings from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let mut settings = Self::default();
        settings.merge(SettingsOverlay::from_toml_file(path)?);
        Ok(settings)
    }

    /// Apply every field the overlay supplies.
    pub fn merge(&mut self, overlay: SettingsOverlay) {
        if let Some(value) = overlay.image_repository {
            self.image_repository = value;
        }
        if let Some(value) = overlay.toolchain_version {
            self.toolchain_version = value;
        }
        if let Some(value) = overlay.cache_volume {
            self.cache_volume = value;
        }
        if let Some(value) = overlay.converter_image {
            self.converter_image = value;
        }
        if let Some(value) = overlay.container_binary {
            self.container_binary = value;
        }
        if overlay.exec_timeout_secs.is_some() {
            self.exec_timeout_secs = overlay.exec_timeout_secs;
        }
        if let Some(value) = overlay.error_policy {
            self.error_policy = value;
        }
        if overlay.output_dir.is_some() {
            self.output_dir = overlay.output_dir;
        }
    }

    /// Load layered settings: defaults, then `path` if given, then the
    /// environment, then `overrides`. The result is validated once, after
    /// every layer is applied.
    pub fn load(path: Option<&Path>, overrides: SettingsOverlay) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(path) = path {
            settings.merge(SettingsOverlay::from_toml_file(path)?);
        }
        settings.merge(SettingsOverlay::from_env()?);
        settings.merge(overrides);
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("image_repository", &self.image_repository),
            ("toolchain_version", &self.toolchain_version),
            ("cache_volume", &self.cache_volume),
            ("converter_image", &self.converter_image),
            ("container_binary", &self.container_binary),
        ] {
            ensure!(
                !value.trim().is_empty(),
                InvalidSettingsSnafu {
                    reason: format!("{field} cannot be empty"),
                }
            );
        }

        ensure!(
            !self.image_repository.contains(':') || self.image_repository.rfind(':') < self.image_repository.rfind('/'),
            InvalidSettingsSnafu {
                reason: format!("image_repository {:?} must not carry a tag", self.image_repository),
            }
        );

        if let Some(timeout) = self.exec_timeout_secs {
            ensure!(
                timeout > 0 && timeout <= MAX_EXEC_TIMEOUT_SECS,
                InvalidSettingsSnafu {
                    reason: format!("exec_timeout_secs must be between 1 and {MAX_EXEC_TIMEOUT_SECS}, got {timeout}"),
                }
            );
        }

        Ok(())
    }
}
