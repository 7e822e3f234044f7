//! Artifact data model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::PARENTS_SEPARATOR;

/// A declared artifact.
///
/// Every attribute forces replacement: there is no in-place update, so two
/// descriptors that differ in anything describe different remote artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDescriptor {
  pub name: String,

  /// Namespace in the registry. `None` means the configured default.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub namespace: Option<String>,

  pub version: String,

  #[serde(rename = "jar_binary_path")]
  pub binary_path: PathBuf,

  #[serde(rename = "json_config_path")]
  pub config_path: PathBuf,
}

impl ArtifactDescriptor {
  /// The namespace this artifact lives in, falling back to `default`.
  pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
    self.namespace.as_deref().unwrap_or(default)
  }

  /// The registry address of this artifact.
  pub fn addr(&self, default_namespace: &str) -> ArtifactAddr {
    ArtifactAddr::new(self.namespace_or(default_namespace), &self.name)
  }

  /// Returns a copy with the namespace filled in.
  pub fn resolved(&self, default_namespace: &str) -> Self {
    Self {
      namespace: Some(self.namespace_or(default_namespace).to_string()),
      ..self.clone()
    }
  }
}

/// A `(namespace, name)` pair locating an artifact in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactAddr {
  pub namespace: String,
  pub name: String,
}

impl ArtifactAddr {
  pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      namespace: namespace.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for ArtifactAddr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.namespace, self.name)
  }
}

/// Decoded artifact config file.
///
/// ```json
/// {
///   "properties": { "widgets.etl": "..." },
///   "parents": ["system:cdap-data-pipeline[6.0.0,7.0.0)"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
  #[serde(default, deserialize_with = "null_as_default")]
  pub properties: BTreeMap<String, String>,

  /// Parent artifacts, in declaration order.
  #[serde(default, deserialize_with = "null_as_default")]
  pub parents: Vec<String>,
}

impl ArtifactConfig {
  /// Value of the `Artifact-Extends` header: parents joined with `/`.
  pub fn extends_header(&self) -> String {
    self.parents.join(PARENTS_SEPARATOR)
  }

  pub fn parent_refs(&self) -> impl Iterator<Item = ParentRef<'_>> {
    self.parents.iter().map(|p| ParentRef::parse(p))
  }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Everything needed to register one artifact version. Built per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPayload {
  pub name: String,
  pub version: String,
  pub config: ArtifactConfig,
  pub binary: Vec<u8>,
}

/// A parent reference in the registry's `[scope:]name[range]` form.
///
/// `system:cdap-data-pipeline[6.0.0,7.0.0)` has scope `system`, name
/// `cdap-data-pipeline` and range `[6.0.0,7.0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef<'a> {
  pub scope: Option<&'a str>,
  pub name: &'a str,
  pub range: Option<&'a str>,
}

impl<'a> ParentRef<'a> {
  pub fn parse(raw: &'a str) -> Self {
    let raw = raw.trim();
    let (head, range) = match raw.find(['[', '(']) {
      Some(idx) => (&raw[..idx], Some(&raw[idx..])),
      None => (raw, None),
    };
    let (scope, name) = match head.split_once(':') {
      Some((scope, name)) => (Some(scope.trim()), name.trim()),
      None => (None, head.trim()),
    };
    Self { scope, name, range }
  }
}
