//! artreg-lib: Declarative artifact management against an application registry.
//!
//! This crate provides the types and logic behind `artreg`:
//! - `artifact`: declared artifacts, their JSON config, and the assembled upload payload
//! - `registry`: the registry's artifact endpoints (upload, properties, list, delete)
//! - `reconcile`: the per-resource lifecycle (create, read, exists, delete)
//! - `plan` / `execute`: refresh, diff and apply a declarations file against recorded state

pub mod artifact;
pub mod consts;
pub mod declare;
pub mod execute;
pub mod plan;
pub mod platform;
pub mod reconcile;
pub mod registry;
pub mod settings;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;
