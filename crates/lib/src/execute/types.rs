//! Types for apply and destroy.

use thiserror::Error;

use crate::declare::DeclareError;
use crate::plan::{Plan, PlanError};
use crate::reconcile::ReconcileError;
use crate::state::StateError;

/// Errors that can occur during apply or destroy.
///
/// State is saved after every completed step, so on error it reflects
/// everything that was done before the failure.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error("declarations error: {0}")]
  Declare(#[from] DeclareError),

  #[error("state error: {0}")]
  State(#[from] StateError),

  #[error("planning failed: {0}")]
  Plan(#[from] PlanError),

  #[error("failed to create '{label}': {source}")]
  CreateFailed {
    label: String,
    #[source]
    source: ReconcileError,
  },

  #[error("failed to delete '{label}': {source}")]
  DeleteFailed {
    label: String,
    #[source]
    source: ReconcileError,
  },
}

/// Options for the apply operation.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
  /// Plan only: refresh, diff, and report without changing anything.
  pub dry_run: bool,
}

/// Options for the destroy operation.
#[derive(Debug, Clone, Default)]
pub struct DestroyOptions {
  /// Report what would be deleted without deleting it.
  pub dry_run: bool,
}

/// Result of an apply operation.
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
  /// The plan that was executed (or would be, on a dry run).
  pub plan: Plan,

  /// Labels created, in creation order.
  pub created: Vec<String>,

  /// Labels deleted, in deletion order.
  pub deleted: Vec<String>,
}

/// Result of a destroy operation.
#[derive(Debug, Clone, Default)]
pub struct DestroyResult {
  /// Labels in deletion order. On a dry run, nothing was actually deleted.
  pub deleted: Vec<String>,
}
