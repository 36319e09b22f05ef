//! Error types for runfetch.
//!
//! Every error is fatal: nothing in the pipeline retries. Lookup misses
//! (workflow or run not found) are not errors at all and never appear here;
//! they end the pipeline successfully with nothing downloaded.

use thiserror::Error;

use crate::zip::ZipError;

/// Result type alias for runfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for runfetch
#[derive(Debug, Error)]
pub enum Error {
    /// Repository option was not of the form `owner/name`
    #[error("invalid repository {0:?}, expected owner/name")]
    InvalidRepository(String),

    /// More than one workflow in the repository carries the requested name
    #[error("more than one workflow found matching the name {0}")]
    AmbiguousWorkflowName(String),

    /// More than one run of the workflow carries the requested run number
    #[error("more than one run found matching the run number {0}")]
    AmbiguousRunNumber(u64),

    /// None of the requested artifact names matched an artifact on the run
    #[error("no artifacts found")]
    NoArtifactsFound,

    /// Unpacking a downloaded artifact archive failed
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ZipError),

    /// The API answered with a non-success status
    #[error("GitHub API request failed with status {status}: {url}")]
    ApiStatus { status: u16, url: String },

    /// Network or transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
