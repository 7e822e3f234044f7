//! Refresh recorded state against the registry.

use tracing::{info, warn};

use crate::reconcile::{Reconciler, ResourceStatus};
use crate::registry::ArtifactRegistry;
use crate::state::State;

use super::PlanError;

/// Check every present resource still exists, dropping those that do not.
///
/// Returns the labels that were dropped. Pending resources are left alone:
/// they are re-created by the next apply either way.
pub async fn refresh<R: ArtifactRegistry>(
  reconciler: &Reconciler<R>,
  state: &mut State,
) -> Result<Vec<String>, PlanError> {
  let mut forgotten = Vec::new();
  let labels: Vec<String> = state
    .resources
    .iter()
    .filter(|(_, resource)| resource.status == ResourceStatus::Present)
    .map(|(label, _)| label.clone())
    .collect();

  for label in labels {
    let Some(resource) = state.get(&label) else {
      continue;
    };
    if reconciler.exists(&resource.descriptor).await? {
      reconciler.read(&resource.descriptor).await?;
    } else {
      warn!(label = %label, artifact = %resource.descriptor.name, "artifact no longer in registry, forgetting it");
      state.remove(&label);
      forgotten.push(label);
    }
  }

  info!(forgotten = forgotten.len(), "refreshed state");
  Ok(forgotten)
}
