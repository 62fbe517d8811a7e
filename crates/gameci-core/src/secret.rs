//! Secret references and their resolved values.
//!
//! Credentials never travel through the command line as plaintext. Callers
//! pass a reference (`env:NAME` or `file:PATH`) and the pipeline resolves it
//! right before the command that needs it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use snafu::ResultExt;
use snafu::ensure;

use crate::constants::MAX_SECRET_FILE_BYTES;
use crate::constants::REDACTED;
use crate::error::CoreError;
use crate::error::EmptySecretSnafu;
use crate::error::Result;
use crate::error::SecretEnvSnafu;
use crate::error::SecretFileSnafu;
use crate::error::SecretTooLargeSnafu;

/// Where a secret value is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef {
    /// Environment variable.
    Env(String),
    /// File on the host.
    File(PathBuf),
}

impl SecretRef {
    /// Read the secret value.
    ///
    /// A single trailing newline (`\n` or `\r\n`) is stripped, since secret
    /// files are usually written by editors or `echo`.
    pub fn resolve(&self) -> Result<SecretValue> {
        let raw = match self {
            SecretRef::Env(name) => std::env::var(name).context(SecretEnvSnafu { name: name.clone() })?,
            SecretRef::File(path) => {
                let size = std::fs::metadata(path).context(SecretFileSnafu { path: path.clone() })?.len();
                ensure!(
                    size <= MAX_SECRET_FILE_BYTES,
                    SecretTooLargeSnafu {
                        path: path.clone(),
                        size,
                        max: MAX_SECRET_FILE_BYTES,
                    }
                );
                std::fs::read_to_string(path).context(SecretFileSnafu { path: path.clone() })?
            }
        };

        let value = raw.strip_suffix('\n').map(|s| s.strip_suffix('\r').unwrap_or(s)).unwrap_or(raw.as_str());
        ensure!(!value.is_empty(), EmptySecretSnafu { reference: self.to_string() });

        Ok(SecretValue(value.to_string()))
    }
}

impl FromStr for SecretRef {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("env:")
            && !name.is_empty()
        {
            return Ok(SecretRef::Env(name.to_string()));
        }
        if let Some(path) = s.strip_prefix("file:")
            && !path.is_empty()
        {
            return Ok(SecretRef::File(PathBuf::from(path)));
        }
        // Do not echo the input: a bare value is most likely the secret itself.
        Err(CoreError::InvalidSecretRef {
            reference: s.split(':').next().filter(|p| *p != s).map(|p| format!("{p}:...")).unwrap_or_default(),
        })
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::Env(name) => write!(f, "env:{name}"),
            SecretRef::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// A resolved secret. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Access the plaintext.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue({REDACTED})")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
