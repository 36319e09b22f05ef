//! # runfetch
//!
//! Download and extract GitHub Actions workflow run artifacts.
//!
//! This library resolves a workflow by display name and a run by run number
//! within a repository, then downloads the run's artifacts matching a
//! requested set of names and unpacks each ZIP archive into a
//! per-artifact subdirectory of a destination path.
//!
//! The pipeline is strictly sequential with no retries: a workflow or run
//! that does not exist ends the operation quietly, while ambiguous matches
//! and download or extraction failures abort it.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use runfetch::{ActionsClient, RepoId, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> runfetch::Result<()> {
//!     let client = ActionsClient::new("ghp_token")?;
//!     let repo: RepoId = "octo-org/widget".parse()?;
//!     let names = vec!["build-output".to_string()];
//!
//!     pipeline::download(&client, &repo, "CI", 42, &names, Path::new("downloads")).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod zip;

pub use cli::{Cli, resolve_dest};
pub use error::{Error, Result};
pub use github::{ActionsClient, RepoId};
pub use pipeline::Lookup;
pub use zip::ZipExtractor;
