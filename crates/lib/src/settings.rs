//! Runtime settings.
//!
//! Read from the environment, then overridden by the caller (the CLI applies
//! its flags on top):
//!
//! | Variable              | Default                       |
//! |-----------------------|-------------------------------|
//! | `ARTREG_HOST`         | none, required to reach a registry |
//! | `ARTREG_NAMESPACE`    | `default`                     |
//! | `ARTREG_STATE`        | `<data_dir>/state.json`       |
//! | `ARTREG_TIMEOUT_SECS` | `60`                          |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::consts::DEFAULT_NAMESPACE;
use crate::platform::paths;

pub const ENV_HOST: &str = "ARTREG_HOST";
pub const ENV_NAMESPACE: &str = "ARTREG_NAMESPACE";
pub const ENV_STATE: &str = "ARTREG_STATE";
pub const ENV_TIMEOUT_SECS: &str = "ARTREG_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("no registry host configured; pass --host or set ARTREG_HOST")]
  MissingHost,

  #[error("no state file location; pass --state or set ARTREG_STATE")]
  NoStatePath,

  #[error("invalid ARTREG_TIMEOUT_SECS value '{0}': expected whole seconds")]
  InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Base URL of the registry, e.g. `http://localhost:11015`.
  pub host: Option<String>,

  /// Namespace for declarations that do not name one.
  pub default_namespace: String,

  pub state_path: PathBuf,

  /// Per-request timeout for registry calls.
  pub timeout: Duration,
}

impl Settings {
  pub fn from_env() -> Result<Self, SettingsError> {
    let host = non_empty_var(ENV_HOST);
    let default_namespace = non_empty_var(ENV_NAMESPACE).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let state_path = match non_empty_var(ENV_STATE) {
      Some(path) => PathBuf::from(path),
      None => paths::state_file().ok_or(SettingsError::NoStatePath)?,
    };
    let timeout = match non_empty_var(ENV_TIMEOUT_SECS) {
      Some(value) => value
        .trim()
        .parse()
        .map(Duration::from_secs)
        .map_err(|_| SettingsError::InvalidTimeout(value))?,
      None => DEFAULT_TIMEOUT,
    };

    Ok(Self {
      host,
      default_namespace,
      state_path,
      timeout,
    })
  }

  /// The registry host, required by anything that talks to the registry.
  pub fn host(&self) -> Result<&str, SettingsError> {
    self.host.as_deref().ok_or(SettingsError::MissingHost)
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
