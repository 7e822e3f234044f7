//! Test helpers shared across modules.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::artifact::{ArtifactAddr, ArtifactDescriptor, ArtifactPayload};
use crate::registry::{ArtifactRegistry, ArtifactSummary, RegistryError};

/// A registry call, with the address rendered as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Upload(String, String),
  SetProperties(String, String),
  List(String),
  Delete(String, String),
}

/// In-memory registry that records every call.
#[derive(Debug, Default)]
pub struct FakeRegistry {
  versions: Mutex<BTreeMap<(String, String), BTreeSet<String>>>,
  properties: Mutex<BTreeMap<(String, String, String), BTreeMap<String, String>>>,
  calls: Mutex<Vec<Call>>,
  upload_failure: Mutex<Option<(u16, String)>>,
  properties_failure: Mutex<Option<(u16, String)>>,
}

impl FakeRegistry {
  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.lock().unwrap().clear();
  }

  /// Make every following upload fail.
  pub fn fail_upload(&self, status: u16, body: &str) {
    *self.upload_failure.lock().unwrap() = Some((status, body.to_string()));
  }

  /// Make every following properties call fail.
  pub fn fail_properties(&self, status: u16, body: &str) {
    *self.properties_failure.lock().unwrap() = Some((status, body.to_string()));
  }

  pub fn heal(&self) {
    *self.upload_failure.lock().unwrap() = None;
    *self.properties_failure.lock().unwrap() = None;
  }

  /// Register a version without going through `upload`.
  pub fn insert(&self, namespace: &str, name: &str, version: &str) {
    self
      .versions
      .lock()
      .unwrap()
      .entry((namespace.to_string(), name.to_string()))
      .or_default()
      .insert(version.to_string());
  }

  /// Remove a whole artifact, as an out-of-band change would.
  pub fn remove(&self, namespace: &str, name: &str) {
    self.versions.lock().unwrap().remove(&(namespace.to_string(), name.to_string()));
  }

  pub fn has_version(&self, namespace: &str, name: &str, version: &str) -> bool {
    self
      .versions
      .lock()
      .unwrap()
      .get(&(namespace.to_string(), name.to_string()))
      .is_some_and(|versions| versions.contains(version))
  }

  pub fn properties_of(&self, namespace: &str, name: &str, version: &str) -> Option<BTreeMap<String, String>> {
    self
      .properties
      .lock()
      .unwrap()
      .get(&(namespace.to_string(), name.to_string(), version.to_string()))
      .cloned()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }

  fn remote(method: &str, status: u16, body: &str) -> RegistryError {
    RegistryError::Remote {
      method: method.to_string(),
      url: "fake://registry".to_string(),
      status,
      body: body.to_string(),
    }
  }
}

impl ArtifactRegistry for FakeRegistry {
  async fn upload(&self, addr: &ArtifactAddr, payload: &ArtifactPayload) -> Result<(), RegistryError> {
    self.record(Call::Upload(addr.to_string(), payload.version.clone()));
    if let Some((status, body)) = self.upload_failure.lock().unwrap().clone() {
      return Err(Self::remote("POST", status, &body));
    }
    self.insert(&addr.namespace, &addr.name, &payload.version);
    Ok(())
  }

  async fn set_properties(
    &self,
    addr: &ArtifactAddr,
    version: &str,
    properties: &BTreeMap<String, String>,
  ) -> Result<(), RegistryError> {
    self.record(Call::SetProperties(addr.to_string(), version.to_string()));
    if let Some((status, body)) = self.properties_failure.lock().unwrap().clone() {
      return Err(Self::remote("PUT", status, &body));
    }
    if !self.has_version(&addr.namespace, &addr.name, version) {
      return Err(Self::remote("PUT", 404, "artifact version not found"));
    }
    self.properties.lock().unwrap().insert(
      (addr.namespace.clone(), addr.name.clone(), version.to_string()),
      properties.clone(),
    );
    Ok(())
  }

  async fn list(&self, namespace: &str) -> Result<Vec<ArtifactSummary>, RegistryError> {
    self.record(Call::List(namespace.to_string()));
    let versions = self.versions.lock().unwrap();
    Ok(
      versions
        .iter()
        .filter(|((ns, _), _)| ns == namespace)
        .flat_map(|((_, name), versions)| {
          versions.iter().map(|version| ArtifactSummary {
            name: name.clone(),
            version: Some(version.clone()),
            scope: Some("USER".to_string()),
          })
        })
        .collect(),
    )
  }

  async fn delete(&self, addr: &ArtifactAddr, version: &str) -> Result<(), RegistryError> {
    self.record(Call::Delete(addr.to_string(), version.to_string()));
    let mut versions = self.versions.lock().unwrap();
    let key = (addr.namespace.clone(), addr.name.clone());
    let removed = versions.get_mut(&key).is_some_and(|set| set.remove(version));
    if !removed {
      return Err(Self::remote("DELETE", 404, "artifact version not found"));
    }
    if versions.get(&key).is_some_and(BTreeSet::is_empty) {
      versions.remove(&key);
    }
    Ok(())
  }
}

/// Write `{name}-{version}.jar` and `{name}-{version}.json` into `dir`.
pub fn write_artifact(dir: &Path, name: &str, version: &str, config_json: &str) -> ArtifactDescriptor {
  let binary_path = dir.join(format!("{name}-{version}.jar"));
  let config_path = dir.join(format!("{name}-{version}.json"));
  fs::write(&binary_path, format!("jar:{name}:{version}")).unwrap();
  fs::write(&config_path, config_json).unwrap();
  ArtifactDescriptor {
    name: name.to_string(),
    namespace: None,
    version: version.to_string(),
    binary_path,
    config_path,
  }
}
