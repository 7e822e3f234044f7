//! Per-resource lifecycle of a declared artifact.
//!
//! ```text
//! Absent --create--> Present --delete--> Absent
//!    \                  ^
//!     \--(upload ok,    | create (retry)
//!        props failed)--> Pending
//! ```
//!
//! Absent means no recorded identity. [`Reconciler::create`] records the
//! artifact name as identity once the upload succeeds; if properties then fail
//! the error carries that identity so the caller can keep the resource as
//! pending and re-run create. Re-running is safe because the registry accepts
//! repeated uploads of the same name and version.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactDescriptor, ArtifactError, assemble_payload};
use crate::registry::{ArtifactRegistry, RegistryError};

/// Stable identity recorded for a created resource: the artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Recorded lifecycle status of a resource that has an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
  /// Uploaded, but properties were not confirmed.
  Pending,
  /// Uploaded and properties set.
  Present,
}

/// Errors from a lifecycle transition.
#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error(transparent)]
  Registry(#[from] RegistryError),

  /// The upload succeeded but setting properties did not.
  #[error("artifact '{id}' was uploaded but setting its properties failed: {source}")]
  PropertiesFailed {
    id: ResourceId,
    #[source]
    source: RegistryError,
  },
}

impl ReconcileError {
  /// Identity established remotely before the failure, if any.
  pub fn established_id(&self) -> Option<&ResourceId> {
    match self {
      ReconcileError::PropertiesFailed { id, .. } => Some(id),
      _ => None,
    }
  }

  /// The registry error underneath, if the failure was remote.
  pub fn registry_error(&self) -> Option<&RegistryError> {
    match self {
      ReconcileError::Registry(err) | ReconcileError::PropertiesFailed { source: err, .. } => Some(err),
      ReconcileError::Artifact(_) => None,
    }
  }
}

/// Runs lifecycle transitions against one registry.
#[derive(Debug, Clone)]
pub struct Reconciler<R> {
  registry: R,
  default_namespace: String,
}

impl<R: ArtifactRegistry> Reconciler<R> {
  pub fn new(registry: R, default_namespace: impl Into<String>) -> Self {
    Self {
      registry,
      default_namespace: default_namespace.into(),
    }
  }

  pub fn registry(&self) -> &R {
    &self.registry
  }

  /// Namespace used for descriptors that do not name one.
  pub fn default_namespace(&self) -> &str {
    &self.default_namespace
  }

  /// Upload the artifact, then attach its properties.
  ///
  /// Properties are always sent, as `{}` when the config has none.
  pub async fn create(&self, descriptor: &ArtifactDescriptor) -> Result<ResourceId, ReconcileError> {
    let payload = assemble_payload(descriptor)?;
    let addr = descriptor.addr(&self.default_namespace);

    self.registry.upload(&addr, &payload).await?;
    let id = ResourceId(payload.name.clone());

    if let Err(source) = self
      .registry
      .set_properties(&addr, &payload.version, &payload.config.properties)
      .await
    {
      warn!(artifact = %addr, version = %payload.version, error = %source, "artifact uploaded without properties");
      return Err(ReconcileError::PropertiesFailed { id, source });
    }

    info!(artifact = %addr, version = %payload.version, "artifact created");
    Ok(id)
  }

  /// Remote drift is not reconciled after creation.
  pub async fn read(&self, descriptor: &ArtifactDescriptor) -> Result<(), ReconcileError> {
    debug!(artifact = %descriptor.addr(&self.default_namespace), "read is a no-op");
    Ok(())
  }

  /// Whether an artifact with this name is listed in its namespace.
  ///
  /// Matches by name only: another version under the same name counts as present.
  pub async fn exists(&self, descriptor: &ArtifactDescriptor) -> Result<bool, ReconcileError> {
    self
      .is_listed(descriptor.namespace_or(&self.default_namespace), &descriptor.name)
      .await
  }

  /// Whether `name` appears in the listing of `namespace`.
  pub async fn is_listed(&self, namespace: &str, name: &str) -> Result<bool, ReconcileError> {
    let artifacts = self.registry.list(namespace).await?;
    let found = artifacts.iter().any(|a| a.name == name);
    debug!(namespace = %namespace, name = %name, found, "checked artifact existence");
    Ok(found)
  }

  /// Delete the declared version.
  ///
  /// A version that is already gone fails with whatever the registry returns.
  pub async fn delete(&self, descriptor: &ArtifactDescriptor) -> Result<(), ReconcileError> {
    let addr = descriptor.addr(&self.default_namespace);
    self.registry.delete(&addr, &descriptor.version).await?;
    info!(artifact = %addr, version = %descriptor.version, "artifact deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::RegistryClient;
  use crate::testutil::{Call, FakeRegistry, write_artifact};
  use mockito::Matcher;
  use std::time::Duration;
  use tempfile::TempDir;

  #[tokio::test]
  async fn create_uploads_then_sets_properties() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", r#"{"properties":{"k":"v"}}"#);
    let reconciler = Reconciler::new(FakeRegistry::default(), "default");

    let id = reconciler.create(&descriptor).await.unwrap();

    assert_eq!(id, ResourceId("etl".to_string()));
    assert_eq!(
      reconciler.registry().calls(),
      vec![
        Call::Upload("default/etl".to_string(), "1.0".to_string()),
        Call::SetProperties("default/etl".to_string(), "1.0".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn create_skips_properties_when_upload_fails() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    let registry = FakeRegistry::default();
    registry.fail_upload(500, "bad jar");
    let reconciler = Reconciler::new(registry, "default");

    let err = reconciler.create(&descriptor).await.unwrap_err();

    assert!(err.established_id().is_none());
    assert_eq!(err.registry_error().and_then(RegistryError::status), Some(500));
    assert_eq!(
      reconciler.registry().calls(),
      vec![Call::Upload("default/etl".to_string(), "1.0".to_string())]
    );
  }

  #[tokio::test]
  async fn create_reports_identity_when_properties_fail() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    let registry = FakeRegistry::default();
    registry.fail_properties(400, "bad properties");
    let reconciler = Reconciler::new(registry, "default");

    let err = reconciler.create(&descriptor).await.unwrap_err();

    assert_eq!(err.established_id(), Some(&ResourceId("etl".to_string())));
    assert!(reconciler.registry().has_version("default", "etl", "1.0"));
  }

  #[tokio::test]
  async fn create_does_not_touch_registry_when_files_missing() {
    let temp = TempDir::new().unwrap();
    let mut descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    descriptor.binary_path = temp.path().join("missing.jar");
    let reconciler = Reconciler::new(FakeRegistry::default(), "default");

    let err = reconciler.create(&descriptor).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Artifact(ArtifactError::Io { .. })));
    assert!(reconciler.registry().calls().is_empty());
  }

  #[tokio::test]
  async fn exists_matches_name_under_any_version() {
    let temp = TempDir::new().unwrap();
    let registry = FakeRegistry::default();
    registry.insert("default", "etl", "0.9");
    let reconciler = Reconciler::new(registry, "default");

    // Declared 1.0, listed 0.9: name-only match still reports present.
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    assert!(reconciler.exists(&descriptor).await.unwrap());

    let missing = write_artifact(temp.path(), "missing", "1.0", "{}");
    assert!(!reconciler.exists(&missing).await.unwrap());
  }

  #[tokio::test]
  async fn exists_uses_descriptor_namespace() {
    let temp = TempDir::new().unwrap();
    let registry = FakeRegistry::default();
    registry.insert("team", "etl", "1.0");
    let reconciler = Reconciler::new(registry, "default");

    let mut descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    assert!(!reconciler.exists(&descriptor).await.unwrap());
    descriptor.namespace = Some("team".to_string());
    assert!(reconciler.exists(&descriptor).await.unwrap());
  }

  #[tokio::test]
  async fn read_never_calls_registry() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    let reconciler = Reconciler::new(FakeRegistry::default(), "default");

    reconciler.read(&descriptor).await.unwrap();
    assert!(reconciler.registry().calls().is_empty());
  }

  #[tokio::test]
  async fn delete_of_missing_version_surfaces_registry_error() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");
    let reconciler = Reconciler::new(FakeRegistry::default(), "default");

    let err = reconciler.delete(&descriptor).await.unwrap_err();
    assert_eq!(err.registry_error().and_then(RegistryError::status), Some(404));
  }

  // End to end over HTTP.

  fn http_reconciler(url: &str) -> Reconciler<RegistryClient> {
    Reconciler::new(RegistryClient::new(url, Duration::from_secs(5)).unwrap(), "default")
  }

  #[tokio::test]
  async fn create_over_http_sends_declared_artifact() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", r#"{"parents":["core","utils"]}"#);
    std::fs::write(&descriptor.binary_path, [0x01, 0x02]).unwrap();

    let mut server = mockito::Server::new_async().await;
    let upload = server
      .mock("POST", "/v3/namespaces/default/artifacts/etl")
      .match_header("Artifact-Version", "1.0")
      .match_header("Artifact-Extends", "core/utils")
      .match_body("\x01\x02")
      .with_status(200)
      .create_async()
      .await;
    let properties = server
      .mock("PUT", "/v3/namespaces/default/artifacts/etl/versions/1.0/properties")
      .match_body(Matcher::Json(serde_json::json!({})))
      .with_status(200)
      .create_async()
      .await;

    http_reconciler(&server.url()).create(&descriptor).await.unwrap();
    upload.assert_async().await;
    properties.assert_async().await;
  }

  #[tokio::test]
  async fn create_twice_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");

    let mut server = mockito::Server::new_async().await;
    let upload = server
      .mock("POST", "/v3/namespaces/default/artifacts/etl")
      .with_status(200)
      .expect(2)
      .create_async()
      .await;
    let properties = server
      .mock("PUT", "/v3/namespaces/default/artifacts/etl/versions/1.0/properties")
      .with_status(200)
      .expect(2)
      .create_async()
      .await;

    let reconciler = http_reconciler(&server.url());
    reconciler.create(&descriptor).await.unwrap();
    reconciler.create(&descriptor).await.unwrap();
    upload.assert_async().await;
    properties.assert_async().await;
  }

  #[tokio::test]
  async fn create_over_http_stops_after_failed_upload() {
    let temp = TempDir::new().unwrap();
    let descriptor = write_artifact(temp.path(), "etl", "1.0", "{}");

    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/v3/namespaces/default/artifacts/etl")
      .with_status(500)
      .with_body("bad jar")
      .create_async()
      .await;
    let properties = server
      .mock("PUT", Matcher::Any)
      .expect(0)
      .create_async()
      .await;

    let err = http_reconciler(&server.url()).create(&descriptor).await.unwrap_err();
    match err {
      ReconcileError::Registry(RegistryError::Remote { status, body, .. }) => {
        assert_eq!(status, 500);
        assert_eq!(body, "bad jar");
      }
      other => panic!("expected remote error, got {other:?}"),
    }
    properties.assert_async().await;
  }

  #[tokio::test]
  async fn exists_over_http_checks_listing() {
    let temp = TempDir::new().unwrap();
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v3/namespaces/default/artifacts")
      .with_status(200)
      .with_body(r#"[{"name":"etl"},{"name":"other"}]"#)
      .expect(2)
      .create_async()
      .await;

    let reconciler = http_reconciler(&server.url());
    let etl = write_artifact(temp.path(), "etl", "1.0", "{}");
    let missing = write_artifact(temp.path(), "missing", "1.0", "{}");
    assert!(reconciler.exists(&etl).await.unwrap());
    assert!(!reconciler.exists(&missing).await.unwrap());
  }
}
