use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

use super::types::{Artifact, ArtifactList, RepoId, Workflow, WorkflowList, WorkflowRun, WorkflowRunList};

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Page size for list endpoints; the API caps pages at 100 items.
const PER_PAGE: u32 = 100;

/// Authenticated client for the GitHub Actions REST API.
///
/// Wraps a [`reqwest::Client`] with bearer-token auth and the Actions
/// endpoints this tool consumes. List endpoints page through the full
/// result set so callers always see the complete collection.
pub struct ActionsClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ActionsClient {
    /// Create a client against the public GitHub API.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root.
    ///
    /// Used for GitHub Enterprise hosts and for tests pointing at a mock
    /// server.
    pub fn with_base_url(token: &str, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = Client::builder()
            .user_agent(concat!("runfetch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.to_string(),
        })
    }

    /// All workflows defined in the repository.
    pub async fn list_workflows(&self, repo: &RepoId) -> Result<Vec<Workflow>> {
        let url = format!("{}/repos/{}/actions/workflows", self.base_url, repo);
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let list: WorkflowList = self.get_json(&url, page).await?;
            let fetched = list.workflows.len();
            all.extend(list.workflows);

            if fetched < PER_PAGE as usize || all.len() as u64 >= list.total_count {
                break;
            }
            page += 1;
        }

        tracing::debug!(repo = %repo, count = all.len(), "listed workflows");
        Ok(all)
    }

    /// All runs recorded for a workflow.
    pub async fn list_runs(&self, repo: &RepoId, workflow_id: u64) -> Result<Vec<WorkflowRun>> {
        let url = format!(
            "{}/repos/{}/actions/workflows/{}/runs",
            self.base_url, repo, workflow_id
        );
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let list: WorkflowRunList = self.get_json(&url, page).await?;
            let fetched = list.workflow_runs.len();
            all.extend(list.workflow_runs);

            if fetched < PER_PAGE as usize || all.len() as u64 >= list.total_count {
                break;
            }
            page += 1;
        }

        tracing::debug!(workflow_id, count = all.len(), "listed workflow runs");
        Ok(all)
    }

    /// All artifacts attached to a run.
    pub async fn list_artifacts(&self, repo: &RepoId, run_id: u64) -> Result<Vec<Artifact>> {
        let url = format!(
            "{}/repos/{}/actions/runs/{}/artifacts",
            self.base_url, repo, run_id
        );
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let list: ArtifactList = self.get_json(&url, page).await?;
            let fetched = list.artifacts.len();
            all.extend(list.artifacts);

            if fetched < PER_PAGE as usize || all.len() as u64 >= list.total_count {
                break;
            }
            page += 1;
        }

        tracing::debug!(run_id, count = all.len(), "listed run artifacts");
        Ok(all)
    }

    /// Download an artifact as a ZIP archive byte buffer.
    ///
    /// The endpoint answers with a redirect to short-lived blob storage;
    /// the client follows it, dropping the auth header across hosts.
    pub async fn download_artifact(&self, repo: &RepoId, artifact_id: u64) -> Result<Vec<u8>> {
        let url = format!(
            "{}/repos/{}/actions/artifacts/{}/zip",
            self.base_url, repo, artifact_id
        );

        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, page: u32) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.json().await?)
    }
}
