//! Implementation of the `artreg apply` command.
//!
//! Makes the registry match a declarations file, recording progress in the
//! state file after every step.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use artreg_lib::declare::Declarations;
use artreg_lib::execute::{ApplyOptions, apply};
use artreg_lib::plan::ChangeKind;

use crate::GlobalArgs;
use crate::output::{format_duration, print_changes, print_info, print_stat, print_success, print_warning};

/// Execute the apply command.
///
/// - Refreshes recorded state, forgetting artifacts removed out of band
/// - Deletes removed and replaced artifacts, dependents first
/// - Creates new, pending, and replaced artifacts, parents first
///
/// On failure the state file keeps every step completed before it.
pub fn cmd_apply(global: &GlobalArgs, file: &Path) -> Result<()> {
  let started = Instant::now();
  let settings = super::resolve_settings(global)?;
  let declarations =
    Declarations::load(file).with_context(|| format!("Failed to load declarations: {}", file.display()))?;
  let reconciler = super::reconciler(&settings)?;
  let store = super::state_store(&settings);

  let rt = super::runtime()?;
  let result = rt
    .block_on(apply(&reconciler, &declarations, &store, &ApplyOptions::default()))
    .context("Apply failed")?;
  let plan = &result.plan;

  for label in &plan.forgotten {
    print_warning(&format!("'{}' was removed from the registry outside artreg", label));
  }

  if !plan.has_changes() {
    print_info("No changes. The registry matches the declarations.");
    return Ok(());
  }

  print_changes(&plan.changes, global.verbose);
  println!();
  print_success(&format!("Apply complete in {}", format_duration(started.elapsed())));
  print_stat("Created", &result.created.len().to_string());
  print_stat("Replaced", &plan.count(|k| matches!(k, ChangeKind::Replace { .. })).to_string());
  print_stat("Deleted", &result.deleted.len().to_string());
  info!(path = %store.path().display(), "state saved");

  Ok(())
}
