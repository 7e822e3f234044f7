mod apply;
mod destroy;
mod exists;
mod plan;
mod status;

pub use apply::cmd_apply;
pub use destroy::cmd_destroy;
pub use exists::cmd_exists;
pub use plan::cmd_plan;
pub use status::cmd_status;

use anyhow::{Context, Result};

use artreg_lib::reconcile::Reconciler;
use artreg_lib::registry::RegistryClient;
use artreg_lib::settings::Settings;
use artreg_lib::state::StateStore;

use crate::GlobalArgs;

/// Settings from the environment with command-line flags applied on top.
fn resolve_settings(global: &GlobalArgs) -> Result<Settings> {
  let mut settings = Settings::from_env().context("Failed to read settings from environment")?;

  if let Some(host) = &global.host {
    settings.host = Some(host.clone());
  }
  if let Some(namespace) = &global.namespace {
    settings.default_namespace = namespace.clone();
  }
  if let Some(state) = &global.state {
    settings.state_path = state.clone();
  }
  if let Some(timeout) = global.timeout {
    settings.timeout = timeout;
  }

  Ok(settings)
}

fn reconciler(settings: &Settings) -> Result<Reconciler<RegistryClient>> {
  let host = settings.host()?;
  let client = RegistryClient::new(host, settings.timeout)
    .with_context(|| format!("Failed to create registry client for {}", host))?;
  Ok(Reconciler::new(client, settings.default_namespace.clone()))
}

fn state_store(settings: &Settings) -> StateStore {
  StateStore::new(&settings.state_path)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
