//! Artifact registry access.
//!
//! [`ArtifactRegistry`] is the set of remote operations the reconciler needs.
//! [`RegistryClient`] implements it over HTTP against
//! `/v3/namespaces/{namespace}/artifacts`.

pub mod client;

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::artifact::{ArtifactAddr, ArtifactPayload};

pub use client::RegistryClient;

/// Errors from talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// The registry host is not usable as a base URL.
  #[error("invalid registry host '{host}': {message}")]
  InvalidHost { host: String, message: String },

  /// The HTTP client could not be constructed.
  #[error("failed to build HTTP client: {0}")]
  ClientBuild(#[source] reqwest::Error),

  /// The request could not be built, so nothing was sent.
  #[error("invalid request to {url}: {source}")]
  InvalidRequest {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The registry could not be reached.
  #[error("request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The registry answered with a non-success status.
  #[error("{method} {url} returned {status}: {body}")]
  Remote {
    method: String,
    url: String,
    status: u16,
    body: String,
  },

  /// The registry's response body could not be decoded.
  #[error("failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },
}

impl RegistryError {
  /// HTTP status for [`RegistryError::Remote`].
  pub fn status(&self) -> Option<u16> {
    match self {
      RegistryError::Remote { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// One entry of a namespace's artifact listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactSummary {
  pub name: String,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub scope: Option<String>,
}

/// Remote operations on a registry's artifacts.
///
/// Uploading the same name and version twice must succeed, which is what makes
/// a failed create safe to re-run from the start.
#[allow(async_fn_in_trait)]
pub trait ArtifactRegistry {
  /// Upload the binary for `payload.version`, declaring its parents.
  async fn upload(&self, addr: &ArtifactAddr, payload: &ArtifactPayload) -> Result<(), RegistryError>;

  /// Replace the properties of an uploaded version.
  async fn set_properties(
    &self,
    addr: &ArtifactAddr,
    version: &str,
    properties: &BTreeMap<String, String>,
  ) -> Result<(), RegistryError>;

  /// List the artifacts visible in a namespace.
  async fn list(&self, namespace: &str) -> Result<Vec<ArtifactSummary>, RegistryError>;

  /// Remove one version of an artifact.
  async fn delete(&self, addr: &ArtifactAddr, version: &str) -> Result<(), RegistryError>;
}
