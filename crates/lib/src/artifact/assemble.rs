//! Payload assembly from local files.

use std::fs;

use tracing::debug;

use super::config::load_artifact_config;
use super::types::{ArtifactDescriptor, ArtifactPayload};
use super::{ArtifactError, FileKind};

/// Read the binary and config of a declared artifact into a payload.
///
/// Only touches the local filesystem.
pub fn assemble_payload(descriptor: &ArtifactDescriptor) -> Result<ArtifactPayload, ArtifactError> {
  let binary = fs::read(&descriptor.binary_path).map_err(|source| ArtifactError::Io {
    kind: FileKind::Binary,
    path: descriptor.binary_path.clone(),
    source,
  })?;
  let config = load_artifact_config(&descriptor.config_path)?;

  debug!(
    name = %descriptor.name,
    version = %descriptor.version,
    size = binary.len(),
    "assembled artifact payload"
  );

  Ok(ArtifactPayload {
    name: descriptor.name.clone(),
    version: descriptor.version.clone(),
    config,
    binary,
  })
}
