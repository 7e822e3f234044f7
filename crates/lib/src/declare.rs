//! Declarations file.
//!
//! The desired set of artifacts, keyed by a label that names the resource:
//!
//! ```json
//! {
//!   "artifacts": {
//!     "etl": {
//!       "name": "etl",
//!       "version": "1.0",
//!       "jar_binary_path": "build/etl-1.0.jar",
//!       "json_config_path": "build/etl-1.0.json"
//!     }
//!   }
//! }
//! ```
//!
//! Relative file paths are resolved against the directory of the declarations file,
//! made absolute first. The resolved paths are recorded in state, so the same file
//! loaded from any working directory yields the same descriptors.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::artifact::ArtifactDescriptor;

/// Errors from loading or validating declarations.
#[derive(Debug, Error)]
pub enum DeclareError {
  #[error("failed to read declarations '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse declarations '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("cannot resolve declarations '{path}' against the working directory: {source}")]
  WorkingDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("artifact '{label}' has an empty {attribute}")]
  EmptyAttribute { label: String, attribute: &'static str },

  #[error("artifacts '{first}' and '{second}' both declare {namespace}/{name}")]
  DuplicateArtifact {
    first: String,
    second: String,
    namespace: String,
    name: String,
  },
}

/// Declared artifacts by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
  #[serde(default)]
  pub artifacts: BTreeMap<String, ArtifactDescriptor>,
}

impl Declarations {
  /// Load a declarations file, resolving relative paths against its directory.
  pub fn load(path: &Path) -> Result<Self, DeclareError> {
    let content = fs::read_to_string(path).map_err(|source| DeclareError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let base_dir = if parent.is_absolute() {
      parent.to_path_buf()
    } else {
      std::env::current_dir()
        .map_err(|source| DeclareError::WorkingDir {
          path: path.to_path_buf(),
          source,
        })?
        .join(parent)
    };
    let declarations = Self::parse(&content, &base_dir).map_err(|source| DeclareError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), artifacts = declarations.artifacts.len(), "loaded declarations");
    Ok(declarations)
  }

  /// Parse declarations from JSON, resolving relative paths against `base_dir`.
  ///
  /// `base_dir` should be absolute: the joined paths are part of each descriptor.
  pub fn parse(content: &str, base_dir: &Path) -> Result<Self, serde_json::Error> {
    let mut declarations: Declarations = serde_json::from_str(content)?;
    for descriptor in declarations.artifacts.values_mut() {
      if descriptor.binary_path.is_relative() {
        descriptor.binary_path = base_dir.join(&descriptor.binary_path);
      }
      if descriptor.config_path.is_relative() {
        descriptor.config_path = base_dir.join(&descriptor.config_path);
      }
    }
    Ok(declarations)
  }

  /// Check required attributes and that each `(namespace, name)` is declared once.
  ///
  /// One version per name keeps name-only existence checks unambiguous.
  pub fn validate(&self, default_namespace: &str) -> Result<(), DeclareError> {
    let mut seen: HashMap<(&str, &str), &str> = HashMap::new();

    for (label, descriptor) in &self.artifacts {
      let empty = |attribute| DeclareError::EmptyAttribute {
        label: label.clone(),
        attribute,
      };
      if descriptor.name.trim().is_empty() {
        return Err(empty("name"));
      }
      if descriptor.version.trim().is_empty() {
        return Err(empty("version"));
      }
      if descriptor.namespace.as_deref().is_some_and(|ns| ns.trim().is_empty()) {
        return Err(empty("namespace"));
      }

      let key = (descriptor.namespace_or(default_namespace), descriptor.name.as_str());
      if let Some(first) = seen.insert(key, label) {
        return Err(DeclareError::DuplicateArtifact {
          first: first.to_string(),
          second: label.clone(),
          namespace: key.0.to_string(),
          name: key.1.to_string(),
        });
      }
    }
    Ok(())
  }

  pub fn get(&self, label: &str) -> Option<&ArtifactDescriptor> {
    self.artifacts.get(label)
  }

  pub fn is_empty(&self) -> bool {
    self.artifacts.is_empty()
  }
}
