//! Implementation of the `artreg exists` command.

use anyhow::{Context, Result};

use crate::GlobalArgs;
use crate::output::{print_info, print_success};

/// Returns whether the registry lists an artifact called `name` in the
/// selected namespace. Any version counts.
pub fn cmd_exists(global: &GlobalArgs, name: &str) -> Result<bool> {
  let settings = super::resolve_settings(global)?;
  let reconciler = super::reconciler(&settings)?;
  let namespace = reconciler.default_namespace().to_string();

  let rt = super::runtime()?;
  let found = rt
    .block_on(reconciler.is_listed(&namespace, name))
    .with_context(|| format!("Failed to list artifacts in namespace '{}'", namespace))?;

  if found {
    print_success(&format!("{}/{} exists", namespace, name));
  } else {
    print_info(&format!("{}/{} not found", namespace, name));
  }

  Ok(found)
}
