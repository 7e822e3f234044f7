//! Declared artifacts and the payload built from them.
//!
//! An artifact is declared by name, version and two local files: the binary
//! and a JSON config carrying properties and parent artifacts. Before any
//! network call, the files are read and combined into an [`ArtifactPayload`].

pub mod assemble;
pub mod config;
pub mod types;

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use assemble::assemble_payload;
pub use config::load_artifact_config;
pub use types::{ArtifactAddr, ArtifactConfig, ArtifactDescriptor, ArtifactPayload, ParentRef};

/// Which local file a read was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Binary,
  Config,
}

impl fmt::Display for FileKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileKind::Binary => write!(f, "binary"),
      FileKind::Config => write!(f, "config"),
    }
  }
}

/// Errors from reading an artifact's local files.
#[derive(Debug, Error)]
pub enum ArtifactError {
  /// A local file could not be read.
  #[error("failed to read artifact {kind} '{path}': {source}")]
  Io {
    kind: FileKind,
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The config file is not a valid artifact config.
  #[error("failed to decode artifact config '{path}': {source}")]
  Decode {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}
