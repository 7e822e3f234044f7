//! Status command implementation.
//!
//! Displays the recorded state. Reads the state file only; the registry is
//! not contacted.

use anyhow::{Context, Result};

use artreg_lib::reconcile::ResourceStatus;

use crate::GlobalArgs;
use crate::output::{print_info, print_json, print_stat, print_warning, symbols};

pub fn cmd_status(global: &GlobalArgs, json: bool) -> Result<()> {
  let settings = super::resolve_settings(global)?;
  let store = super::state_store(&settings);
  let state = store
    .load()
    .with_context(|| format!("Failed to load state: {}", store.path().display()))?;

  if json {
    return print_json(&state);
  }

  if state.is_empty() {
    print_info("No artifacts recorded. Run 'artreg apply' to register some.");
    return Ok(());
  }

  print_stat("State", &store.path().display().to_string());
  print_stat("Artifacts", &state.resources.len().to_string());
  println!();

  for (label, resource) in &state.resources {
    let d = &resource.descriptor;
    let namespace = d.namespace_or(&settings.default_namespace);
    match resource.status {
      ResourceStatus::Present => {
        println!("  {} {} ({}/{} {})", symbols::INFO, label, namespace, d.name, d.version)
      }
      ResourceStatus::Pending => print_warning(&format!(
        "{} ({}/{} {}) is pending: uploaded without properties, next apply retries",
        label, namespace, d.name, d.version
      )),
    }

    if global.verbose {
      print_stat("    binary", &d.binary_path.display().to_string());
      print_stat("    config", &d.config_path.display().to_string());
      if !resource.parents.is_empty() {
        print_stat("    parents", &resource.parents.join(", "));
      }
    }
  }

  Ok(())
}
