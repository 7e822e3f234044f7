//! Persisted resource state.
//!
//! Records, per declaration label, the identity a create established and the
//! resolved descriptor it was created from. Deletes and replacements are
//! planned from this record, so it also keeps the parents seen at create time.
//!
//! # Example State File
//!
//! ```json
//! {
//!   "version": 1,
//!   "resources": {
//!     "etl": {
//!       "id": "etl",
//!       "status": "present",
//!       "descriptor": {
//!         "name": "etl",
//!         "namespace": "default",
//!         "version": "1.0",
//!         "jar_binary_path": "/work/etl-1.0.jar",
//!         "json_config_path": "/work/etl.json"
//!       },
//!       "parents": ["system:cdap-data-pipeline[6.0.0,7.0.0)"]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::ArtifactDescriptor;
use crate::reconcile::{ResourceId, ResourceStatus};

/// Current state file format version.
pub const STATE_VERSION: u32 = 1;

/// Recorded state of one declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
  pub id: ResourceId,
  pub status: ResourceStatus,
  /// Descriptor with its namespace resolved.
  pub descriptor: ArtifactDescriptor,
  #[serde(default)]
  pub parents: Vec<String>,
}

/// All recorded resources, keyed by declaration label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
  pub version: u32,
  #[serde(default)]
  pub resources: BTreeMap<String, ResourceState>,
}

impl Default for State {
  fn default() -> Self {
    Self {
      version: STATE_VERSION,
      resources: BTreeMap::new(),
    }
  }
}

impl State {
  pub fn is_empty(&self) -> bool {
    self.resources.is_empty()
  }

  pub fn get(&self, label: &str) -> Option<&ResourceState> {
    self.resources.get(label)
  }

  pub fn insert(&mut self, label: impl Into<String>, resource: ResourceState) {
    self.resources.insert(label.into(), resource);
  }

  pub fn remove(&mut self, label: &str) -> Option<ResourceState> {
    self.resources.remove(label)
  }
}

/// Errors that can occur when reading or writing state.
#[derive(Debug, Error)]
pub enum StateError {
  #[error("failed to read state file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write state file '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse state file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize state: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("state file '{path}' has version {found}, expected {expected}")]
  UnsupportedVersion { path: PathBuf, found: u32, expected: u32 },
}

/// Reads and writes the state file.
#[derive(Debug, Clone)]
pub struct StateStore {
  path: PathBuf,
}

impl StateStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Load state. A missing file is empty state.
  pub fn load(&self) -> Result<State, StateError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "state file not found, starting empty");
        return Ok(State::default());
      }
      Err(source) => {
        return Err(StateError::Read {
          path: self.path.clone(),
          source,
        });
      }
    };

    let state: State = serde_json::from_str(&content).map_err(|source| StateError::Parse {
      path: self.path.clone(),
      source,
    })?;
    if state.version != STATE_VERSION {
      return Err(StateError::UnsupportedVersion {
        path: self.path.clone(),
        found: state.version,
        expected: STATE_VERSION,
      });
    }

    debug!(path = %self.path.display(), resources = state.resources.len(), "loaded state");
    Ok(state)
  }

  /// Save state atomically: write to a temp file, then rename.
  pub fn save(&self, state: &State) -> Result<(), StateError> {
    let write_err = |source| StateError::Write {
      path: self.path.clone(),
      source,
    };

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
    let temp_path = self.temp_path();
    fs::write(&temp_path, content).map_err(write_err)?;
    fs::rename(&temp_path, &self.path).map_err(write_err)?;

    info!(path = %self.path.display(), resources = state.resources.len(), "state saved");
    Ok(())
  }

  /// Sibling of the state file with `.tmp` appended to its full name.
  fn temp_path(&self) -> PathBuf {
    let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    self.path.with_file_name(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn temp_store() -> (TempDir, StateStore) {
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("nested").join("state.json"));
    (temp, store)
  }

  fn resource(status: ResourceStatus) -> ResourceState {
    ResourceState {
      id: ResourceId("etl".to_string()),
      status,
      descriptor: ArtifactDescriptor {
        name: "etl".to_string(),
        namespace: Some("default".to_string()),
        version: "1.0".to_string(),
        binary_path: PathBuf::from("/work/etl.jar"),
        config_path: PathBuf::from("/work/etl.json"),
      },
      parents: vec!["core".to_string()],
    }
  }

  #[test]
  fn load_missing_file_is_empty() {
    let (_temp, store) = temp_store();
    let state = store.load().unwrap();
    assert!(state.is_empty());
    assert_eq!(state.version, STATE_VERSION);
  }

  #[test]
  fn save_creates_parent_dirs_and_loads_back() {
    let (_temp, store) = temp_store();
    let mut state = State::default();
    state.insert("etl", resource(ResourceStatus::Pending));

    store.save(&state).unwrap();
    assert!(!store.path().with_file_name("state.json.tmp").exists());
    assert_eq!(store.load().unwrap(), state);
  }

  #[test]
  fn temp_file_keeps_custom_extension() {
    let temp = TempDir::new().unwrap();
    let first = StateStore::new(temp.path().join("state.v1"));
    let second = StateStore::new(temp.path().join("state.v2"));
    assert_eq!(first.temp_path(), temp.path().join("state.v1.tmp"));
    assert_ne!(first.temp_path(), second.temp_path());

    first.save(&State::default()).unwrap();
    assert!(first.path().exists());
    assert!(!temp.path().join("state.json.tmp").exists());
    assert!(!first.temp_path().exists());
  }

  #[test]
  fn status_is_lowercase_on_disk() {
    let (_temp, store) = temp_store();
    let mut state = State::default();
    state.insert("etl", resource(ResourceStatus::Present));
    store.save(&state).unwrap();

    let content = fs::read_to_string(store.path()).unwrap();
    assert!(content.contains(r#""status": "present""#));
    assert!(content.contains(r#""jar_binary_path": "/work/etl.jar""#));
  }

  #[test]
  fn rejects_unknown_version() {
    let (_temp, store) = temp_store();
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), r#"{"version": 7, "resources": {}}"#).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, StateError::UnsupportedVersion { found: 7, .. }));
  }

  #[test]
  fn rejects_malformed_state() {
    let (_temp, store) = temp_store();
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "{").unwrap();
    assert!(matches!(store.load(), Err(StateError::Parse { .. })));
  }
}
