//! Artifact config loading.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::types::ArtifactConfig;
use super::{ArtifactError, FileKind};

/// Read and decode an artifact config file.
///
/// Absent `properties` or `parents` decode as empty; nothing else is defaulted.
pub fn load_artifact_config(path: &Path) -> Result<ArtifactConfig, ArtifactError> {
  let content = fs::read(path).map_err(|source| ArtifactError::Io {
    kind: FileKind::Config,
    path: path.to_path_buf(),
    source,
  })?;

  let config: ArtifactConfig = serde_json::from_slice(&content).map_err(|source| ArtifactError::Decode {
    path: path.to_path_buf(),
    source,
  })?;

  debug!(
    path = %path.display(),
    properties = config.properties.len(),
    parents = config.parents.len(),
    "loaded artifact config"
  );
  Ok(config)
}
