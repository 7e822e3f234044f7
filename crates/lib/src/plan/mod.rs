//! Planning: what apply has to do to make the registry match the declarations.
//!
//! Planning runs in two steps:
//!
//! 1. [`refresh`] asks the registry whether recorded artifacts still exist
//!    and forgets the ones that do not.
//! 2. [`compute_plan`] diffs declarations against the refreshed state. It is
//!    local only: it reads artifact configs to learn parents, nothing else.
//!
//! # Diff Logic
//!
//! - Declared, not recorded → create
//! - Declared, recorded as pending with the same descriptor → create again
//! - Declared, recorded with a different descriptor → replace (delete, then create)
//! - Declared, recorded as present with the same descriptor → unchanged
//! - Recorded, not declared → delete
//!
//! Every attribute forces replacement, so "different descriptor" means any
//! difference once the namespace is resolved.

pub mod order;
pub mod refresh;

use std::fmt;

use thiserror::Error;

use crate::artifact::{ArtifactDescriptor, ArtifactError, load_artifact_config};
use crate::declare::{DeclareError, Declarations};
use crate::reconcile::{ReconcileError, ResourceStatus};
use crate::state::State;

use order::{OrderNode, dependency_order};

pub use refresh::refresh;

/// Errors that can occur while planning.
#[derive(Debug, Error)]
pub enum PlanError {
  #[error("invalid declarations: {0}")]
  Declare(#[from] DeclareError),

  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error("refresh failed: {0}")]
  Reconcile(#[from] ReconcileError),

  /// Parent references form a cycle.
  #[error("dependency cycle through artifact '{label}'")]
  DependencyCycle { label: String },
}

/// Why a create is planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateReason {
  /// Not recorded yet.
  New,
  /// Recorded as pending; upload and properties are sent again.
  Resume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
  Create(CreateReason),
  /// Delete `previous`, then create the declared descriptor.
  Replace { previous: ArtifactDescriptor },
  Delete,
  Unchanged,
}

/// Planned change for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
  pub label: String,
  pub kind: ChangeKind,
  /// The declared descriptor, or the recorded one for a delete. Namespace resolved.
  pub descriptor: ArtifactDescriptor,
  /// Parents of `descriptor`: from its config file when it is about to be created, else as recorded.
  pub parents: Vec<String>,
}

impl Change {
  pub fn symbol(&self) -> &'static str {
    match self.kind {
      ChangeKind::Create(_) => "+",
      ChangeKind::Replace { .. } => "-/+",
      ChangeKind::Delete => "-",
      ChangeKind::Unchanged => " ",
    }
  }
}

impl fmt::Display for Change {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let d = &self.descriptor;
    let namespace = d.namespace.as_deref().unwrap_or_default();
    write!(f, "{} ({}/{} {})", self.label, namespace, d.name, d.version)?;
    match &self.kind {
      ChangeKind::Create(CreateReason::Resume) => write!(f, " resuming pending create"),
      ChangeKind::Replace { previous } => write!(f, " replaces version {}", previous.version),
      _ => Ok(()),
    }
  }
}

/// The changes apply will make, and the order to make them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
  /// One entry per label, sorted by label.
  pub changes: Vec<Change>,

  /// Labels to delete (deletes and replacements), dependents first.
  pub delete_order: Vec<String>,

  /// Labels to create (creates and replacements), parents first.
  pub create_order: Vec<String>,

  /// Labels dropped from state by refresh because the artifact was gone.
  pub forgotten: Vec<String>,
}

impl Plan {
  /// Returns true if apply would call the registry.
  pub fn has_changes(&self) -> bool {
    !self.delete_order.is_empty() || !self.create_order.is_empty()
  }

  pub fn change(&self, label: &str) -> Option<&Change> {
    self.changes.iter().find(|c| c.label == label)
  }

  pub fn count(&self, matches: impl Fn(&ChangeKind) -> bool) -> usize {
    self.changes.iter().filter(|c| matches(&c.kind)).count()
  }
}

/// Diff declarations against recorded state.
pub fn compute_plan(declarations: &Declarations, state: &State, default_namespace: &str) -> Result<Plan, PlanError> {
  declarations.validate(default_namespace)?;

  let mut changes = Vec::new();
  for (label, declared) in &declarations.artifacts {
    let descriptor = declared.resolved(default_namespace);
    let recorded = state.get(label);
    let kind = match recorded {
      None => ChangeKind::Create(CreateReason::New),
      Some(recorded) if recorded.descriptor != descriptor => ChangeKind::Replace {
        previous: recorded.descriptor.clone(),
      },
      Some(recorded) if recorded.status == ResourceStatus::Pending => ChangeKind::Create(CreateReason::Resume),
      Some(_) => ChangeKind::Unchanged,
    };
    let parents = match (&kind, recorded) {
      (ChangeKind::Unchanged, Some(recorded)) => recorded.parents.clone(),
      _ => load_artifact_config(&descriptor.config_path)?.parents,
    };
    changes.push(Change {
      label: label.clone(),
      kind,
      descriptor,
      parents,
    });
  }
  for (label, recorded) in &state.resources {
    if declarations.get(label).is_none() {
      changes.push(Change {
        label: label.clone(),
        kind: ChangeKind::Delete,
        descriptor: recorded.descriptor.clone(),
        parents: recorded.parents.clone(),
      });
    }
  }
  changes.sort_by(|a, b| a.label.cmp(&b.label));

  let create_nodes: Vec<OrderNode<'_>> = changes
    .iter()
    .filter(|c| matches!(c.kind, ChangeKind::Create(_) | ChangeKind::Replace { .. }))
    .map(|c| order_node(&c.label, &c.descriptor, &c.parents))
    .collect();

  // A replacement deletes what was recorded, so its old parents order the delete.
  let delete_nodes: Vec<OrderNode<'_>> = changes
    .iter()
    .filter(|c| matches!(c.kind, ChangeKind::Delete | ChangeKind::Replace { .. }))
    .filter_map(|c| state.get(&c.label).map(|recorded| (c, recorded)))
    .map(|(change, recorded)| order_node(&change.label, &recorded.descriptor, &recorded.parents))
    .collect();

  let create_order = dependency_order(&create_nodes)?;
  let mut delete_order = dependency_order(&delete_nodes)?;
  delete_order.reverse();

  Ok(Plan {
    changes,
    delete_order,
    create_order,
    forgotten: Vec::new(),
  })
}

fn order_node<'a>(label: &'a str, descriptor: &'a ArtifactDescriptor, parents: &'a [String]) -> OrderNode<'a> {
  OrderNode {
    label,
    namespace: descriptor.namespace.as_deref().unwrap_or_default(),
    name: &descriptor.name,
    parents,
  }
}
