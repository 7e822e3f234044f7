//! Implementation of the `artreg destroy` command.
//!
//! Deletes every artifact recorded in state, dependents before their parents.

use anyhow::{Context, Result};

use artreg_lib::execute::{DestroyOptions, destroy};

use crate::GlobalArgs;
use crate::output::{print_info, print_success};

pub fn cmd_destroy(global: &GlobalArgs, dry_run: bool) -> Result<()> {
  let settings = super::resolve_settings(global)?;
  let reconciler = super::reconciler(&settings)?;
  let store = super::state_store(&settings);

  let rt = super::runtime()?;
  let result = rt
    .block_on(destroy(&reconciler, &store, &DestroyOptions { dry_run }))
    .context("Destroy failed")?;

  if result.deleted.is_empty() {
    print_info("Nothing to destroy.");
    return Ok(());
  }

  if dry_run {
    println!("Destroy dry run:");
    for label in &result.deleted {
      println!("  - {}", label);
    }
    println!("  Would delete {} artifact(s)", result.deleted.len());
  } else {
    print_success(&format!("Destroy complete: {} artifact(s) deleted", result.deleted.len()));
    for label in &result.deleted {
      println!("  - {}", label);
    }
  }

  Ok(())
}
