//! Apply orchestration.
//!
//! 1. Load current state
//! 2. Refresh: forget recorded artifacts the registry no longer lists
//! 3. Compute the plan
//! 4. Delete removed and replaced artifacts
//! 5. Create new, pending, and replaced artifacts
//!
//! Nothing is rolled back on failure. A create that uploaded the binary but
//! failed on properties is recorded as pending, and the next apply re-runs it.

use tracing::{error, info};

use crate::declare::Declarations;
use crate::plan::{Change, compute_plan, refresh};
use crate::reconcile::{Reconciler, ResourceStatus};
use crate::registry::ArtifactRegistry;
use crate::state::{ResourceState, State, StateStore};

use super::types::{ApplyOptions, ApplyResult, DestroyOptions, DestroyResult, ExecuteError};

/// Make the registry match `declarations`, recording progress in `store`.
pub async fn apply<R: ArtifactRegistry>(
  reconciler: &Reconciler<R>,
  declarations: &Declarations,
  store: &StateStore,
  options: &ApplyOptions,
) -> Result<ApplyResult, ExecuteError> {
  let mut state = store.load()?;
  info!(declared = declarations.artifacts.len(), recorded = state.resources.len(), "starting apply");

  let forgotten = refresh(reconciler, &mut state).await?;
  let mut plan = compute_plan(declarations, &state, reconciler.default_namespace())?;
  plan.forgotten = forgotten;

  let mut result = ApplyResult {
    plan,
    ..Default::default()
  };

  if options.dry_run {
    info!(
      deletes = result.plan.delete_order.len(),
      creates = result.plan.create_order.len(),
      "dry run, not applying"
    );
    return Ok(result);
  }

  if !result.plan.forgotten.is_empty() {
    store.save(&state)?;
  }

  for label in &result.plan.delete_order {
    delete_one(reconciler, store, &mut state, label).await?;
    result.deleted.push(label.clone());
  }

  for label in &result.plan.create_order {
    let Some(change) = result.plan.change(label) else {
      continue;
    };
    create_one(reconciler, store, &mut state, change).await?;
    result.created.push(label.clone());
  }

  info!(created = result.created.len(), deleted = result.deleted.len(), "apply complete");
  Ok(result)
}

/// Delete every recorded artifact, dependents first.
pub async fn destroy<R: ArtifactRegistry>(
  reconciler: &Reconciler<R>,
  store: &StateStore,
  options: &DestroyOptions,
) -> Result<DestroyResult, ExecuteError> {
  let mut state = store.load()?;
  let plan = compute_plan(&Declarations::default(), &state, reconciler.default_namespace())?;
  info!(recorded = state.resources.len(), dry_run = options.dry_run, "starting destroy");

  if options.dry_run {
    return Ok(DestroyResult {
      deleted: plan.delete_order,
    });
  }

  let mut result = DestroyResult::default();
  for label in plan.delete_order {
    delete_one(reconciler, store, &mut state, &label).await?;
    result.deleted.push(label);
  }

  info!(deleted = result.deleted.len(), "destroy complete");
  Ok(result)
}

async fn delete_one<R: ArtifactRegistry>(
  reconciler: &Reconciler<R>,
  store: &StateStore,
  state: &mut State,
  label: &str,
) -> Result<(), ExecuteError> {
  let Some(recorded) = state.get(label) else {
    return Ok(());
  };

  if let Err(source) = reconciler.delete(&recorded.descriptor).await {
    error!(label = %label, error = %source, "delete failed");
    return Err(ExecuteError::DeleteFailed {
      label: label.to_string(),
      source,
    });
  }

  state.remove(label);
  store.save(state)?;
  Ok(())
}

async fn create_one<R: ArtifactRegistry>(
  reconciler: &Reconciler<R>,
  store: &StateStore,
  state: &mut State,
  change: &Change,
) -> Result<(), ExecuteError> {
  let record = |id, status| ResourceState {
    id,
    status,
    descriptor: change.descriptor.clone(),
    parents: change.parents.clone(),
  };

  match reconciler.create(&change.descriptor).await {
    Ok(id) => {
      state.insert(&change.label, record(id, ResourceStatus::Present));
      store.save(state)?;
      Ok(())
    }
    Err(source) => {
      error!(label = %change.label, error = %source, "create failed");
      if let Some(id) = source.established_id() {
        state.insert(&change.label, record(id.clone(), ResourceStatus::Pending));
        store.save(state)?;
      }
      Err(ExecuteError::CreateFailed {
        label: change.label.clone(),
        source,
      })
    }
  }
}
