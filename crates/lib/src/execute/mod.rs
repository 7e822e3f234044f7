//! Apply and destroy drivers.
//!
//! These run the lifecycle transitions of [`crate::reconcile`] for a whole
//! declarations file, one resource at a time:
//! - Load recorded state and refresh it against the registry
//! - Plan the diff between declarations and state
//! - Delete, dependents first
//! - Create, parents first
//! - Save state after every step

pub mod apply;
pub mod types;

pub use apply::{apply, destroy};
pub use types::{ApplyOptions, ApplyResult, DestroyOptions, DestroyResult, ExecuteError};
