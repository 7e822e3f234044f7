//! Implementation of the `artreg plan` command.
//!
//! Refreshes recorded state against the registry and prints the changes
//! apply would make. Nothing is uploaded, deleted, or saved.

use std::path::Path;

use anyhow::{Context, Result};

use artreg_lib::declare::Declarations;
use artreg_lib::execute::{ApplyOptions, apply};
use artreg_lib::plan::ChangeKind;

use crate::GlobalArgs;
use crate::output::{print_changes, print_info, print_stat, print_warning};

pub fn cmd_plan(global: &GlobalArgs, file: &Path) -> Result<()> {
  let settings = super::resolve_settings(global)?;
  let declarations =
    Declarations::load(file).with_context(|| format!("Failed to load declarations: {}", file.display()))?;
  let reconciler = super::reconciler(&settings)?;
  let store = super::state_store(&settings);

  let options = ApplyOptions { dry_run: true };
  let rt = super::runtime()?;
  let result = rt
    .block_on(apply(&reconciler, &declarations, &store, &options))
    .context("Plan failed")?;
  let plan = &result.plan;

  for label in &plan.forgotten {
    print_warning(&format!("'{}' is no longer in the registry and will be created again", label));
  }

  if !plan.has_changes() {
    print_info("No changes. The registry matches the declarations.");
    return Ok(());
  }

  println!("Plan:");
  print_changes(&plan.changes, global.verbose);
  println!();
  print_stat("To create", &plan.count(|k| matches!(k, ChangeKind::Create(_))).to_string());
  print_stat("To replace", &plan.count(|k| matches!(k, ChangeKind::Replace { .. })).to_string());
  print_stat("To delete", &plan.count(|k| matches!(k, ChangeKind::Delete)).to_string());
  print_stat("Unchanged", &plan.count(|k| matches!(k, ChangeKind::Unchanged)).to_string());

  Ok(())
}
