//! GitHub Actions API surface: payload models and the authenticated client.

mod client;
mod types;

pub use client::ActionsClient;
pub use types::{Artifact, RepoId, Workflow, WorkflowRun};
