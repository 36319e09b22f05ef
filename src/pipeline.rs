//! Sequential resolution pipeline.
//!
//! `workflow name → workflow id → run id → artifact set → download → extract`
//!
//! Each stage either narrows to exactly one identifier or ends the run:
//! a missing workflow or run is "nothing to do" and completes successfully,
//! while an ambiguous match or a fetch failure aborts the whole operation.
//! No stage retries and nothing runs concurrently.

use std::path::Path;

use crate::error::{Error, Result};
use crate::github::{ActionsClient, Artifact, RepoId, Workflow, WorkflowRun};
use crate::zip::ZipExtractor;

/// Outcome of a lookup that is required to match at most one item.
///
/// Callers pattern-match: `Absent` is not an error, `Ambiguous` is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Absent,
    Found(T),
    Ambiguous,
}

/// Classify workflows matching `name` by exact display-name equality.
pub fn match_workflow(workflows: &[Workflow], name: &str) -> Lookup<u64> {
    let matches: Vec<&Workflow> = workflows.iter().filter(|w| w.name == name).collect();
    match matches.as_slice() {
        [] => Lookup::Absent,
        [workflow] => Lookup::Found(workflow.id),
        _ => Lookup::Ambiguous,
    }
}

/// Classify runs matching `run_number` exactly.
pub fn match_run(runs: &[WorkflowRun], run_number: u64) -> Lookup<u64> {
    let matches: Vec<&WorkflowRun> = runs.iter().filter(|r| r.run_number == run_number).collect();
    match matches.as_slice() {
        [] => Lookup::Absent,
        [run] => Lookup::Found(run.id),
        _ => Lookup::Ambiguous,
    }
}

/// Resolve a workflow display name to its id within the repository.
pub async fn resolve_workflow(
    client: &ActionsClient,
    repo: &RepoId,
    name: &str,
) -> Result<Lookup<u64>> {
    let workflows = client.list_workflows(repo).await?;
    Ok(match_workflow(&workflows, name))
}

/// Resolve a run number to its run id within a workflow.
pub async fn resolve_run(
    client: &ActionsClient,
    repo: &RepoId,
    workflow_id: u64,
    run_number: u64,
) -> Result<Lookup<u64>> {
    let runs = client.list_runs(repo, workflow_id).await?;
    Ok(match_run(&runs, run_number))
}

/// Download and extract every artifact of `run_id` whose name is in `names`.
///
/// Requested names that match nothing are ignored; only an entirely empty
/// match set fails. Each matched artifact is downloaded and unpacked into
/// `dest/<artifact name>`, one at a time.
pub async fn fetch_artifacts(
    client: &ActionsClient,
    repo: &RepoId,
    run_id: u64,
    names: &[String],
    dest: &Path,
) -> Result<()> {
    let artifacts = client.list_artifacts(repo, run_id).await?;
    let wanted: Vec<&Artifact> = artifacts
        .iter()
        .filter(|artifact| names.iter().any(|name| *name == artifact.name))
        .collect();

    if wanted.is_empty() {
        return Err(Error::NoArtifactsFound);
    }

    for artifact in wanted {
        tracing::info!(
            name = %artifact.name,
            id = artifact.id,
            size = artifact.size_in_bytes,
            "downloading artifact"
        );
        let bytes = client.download_artifact(repo, artifact.id).await?;
        let target = dest.join(&artifact.name);
        ZipExtractor::new(&bytes).extract_all(&target).await?;
    }

    Ok(())
}

/// Run the whole pipeline against a repository.
///
/// A workflow or run that does not exist ends the operation quietly with
/// nothing downloaded. Everything else either succeeds or surfaces the
/// first error.
pub async fn download(
    client: &ActionsClient,
    repo: &RepoId,
    workflow_name: &str,
    run_number: u64,
    names: &[String],
    dest: &Path,
) -> Result<()> {
    let workflow_id = match resolve_workflow(client, repo, workflow_name).await? {
        Lookup::Absent => {
            tracing::info!(workflow = workflow_name, "no matching workflow, nothing to do");
            return Ok(());
        }
        Lookup::Ambiguous => return Err(Error::AmbiguousWorkflowName(workflow_name.to_string())),
        Lookup::Found(id) => id,
    };

    let run_id = match resolve_run(client, repo, workflow_id, run_number).await? {
        Lookup::Absent => {
            tracing::info!(run_number, "no matching run, nothing to do");
            return Ok(());
        }
        Lookup::Ambiguous => return Err(Error::AmbiguousRunNumber(run_number)),
        Lookup::Found(id) => id,
    };

    fetch_artifacts(client, repo, run_id, names, dest).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::testutil::{EntrySpec, build_archive};
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn workflow(id: u64, name: &str) -> Workflow {
        Workflow {
            id,
            name: name.to_string(),
        }
    }

    fn run(id: u64, run_number: u64) -> WorkflowRun {
        WorkflowRun { id, run_number }
    }

    #[test]
    fn workflow_match_classifies_zero_one_many() {
        let workflows = [workflow(1, "CI"), workflow(2, "Release"), workflow(3, "CI")];

        assert_eq!(match_workflow(&workflows, "Nightly"), Lookup::Absent);
        assert_eq!(match_workflow(&workflows, "Release"), Lookup::Found(2));
        assert_eq!(match_workflow(&workflows, "CI"), Lookup::Ambiguous);
        assert_eq!(match_workflow(&[], "CI"), Lookup::Absent);
    }

    #[test]
    fn run_match_classifies_zero_one_many() {
        let runs = [run(10, 1), run(11, 2), run(12, 2)];

        assert_eq!(match_run(&runs, 3), Lookup::Absent);
        assert_eq!(match_run(&runs, 1), Lookup::Found(10));
        assert_eq!(match_run(&runs, 2), Lookup::Ambiguous);
    }

    fn repo() -> RepoId {
        "octo-org/widget".parse().unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn mount_workflows(server: &MockServer, workflows: serde_json::Value) {
        let count = workflows.as_array().unwrap().len();
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/actions/workflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": count,
                "workflows": workflows
            })))
            .mount(server)
            .await;
    }

    async fn mount_runs(server: &MockServer, workflow_id: u64, runs: serde_json::Value) {
        let count = runs.as_array().unwrap().len();
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/octo-org/widget/actions/workflows/{workflow_id}/runs"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": count,
                "workflow_runs": runs
            })))
            .mount(server)
            .await;
    }

    async fn mount_artifacts(server: &MockServer, run_id: u64, artifacts: serde_json::Value) {
        let count = artifacts.as_array().unwrap().len();
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/octo-org/widget/actions/runs/{run_id}/artifacts"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": count,
                "artifacts": artifacts
            })))
            .mount(server)
            .await;
    }

    fn artifact_json(id: u64, name: &str) -> serde_json::Value {
        json!({"id": id, "name": name, "size_in_bytes": 128, "expired": false})
    }

    #[tokio::test]
    async fn absent_workflow_completes_without_downloading() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "Other"}])).await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        download(&client, &repo(), "CI", 5, &names(&["a"]), tmp.path())
            .await
            .unwrap();

        // Nothing was created under the destination
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn duplicate_workflow_names_are_fatal() {
        let server = MockServer::start().await;
        mount_workflows(
            &server,
            json!([{"id": 1, "name": "CI"}, {"id": 2, "name": "CI"}]),
        )
        .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        let err = download(&client, &repo(), "CI", 5, &names(&["a"]), tmp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AmbiguousWorkflowName(name) if name == "CI"));
    }

    #[tokio::test]
    async fn absent_run_completes_without_downloading() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(&server, 1, json!([{"id": 100, "run_number": 4}])).await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        download(&client, &repo(), "CI", 5, &names(&["a"]), tmp.path())
            .await
            .unwrap();

        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn duplicate_run_numbers_are_fatal() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(
            &server,
            1,
            json!([{"id": 100, "run_number": 5}, {"id": 101, "run_number": 5}]),
        )
        .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        let err = download(&client, &repo(), "CI", 5, &names(&["a"]), tmp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AmbiguousRunNumber(5)));
    }

    #[tokio::test]
    async fn downloads_only_requested_artifacts() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(&server, 1, json!([{"id": 100, "run_number": 5}])).await;
        mount_artifacts(
            &server,
            100,
            json!([
                artifact_json(201, "a"),
                artifact_json(202, "b"),
                artifact_json(203, "c"),
            ]),
        )
        .await;

        let archive = build_archive(&[EntrySpec::file("build/output.txt", b"payload")]);
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/actions/artifacts/202/zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
            .expect(1)
            .mount(&server)
            .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        // "d" matches nothing and raises no error
        download(&client, &repo(), "CI", 5, &names(&["b", "d"]), tmp.path())
            .await
            .unwrap();

        let extracted = tmp.path().join("b/build/output.txt");
        assert_eq!(std::fs::read(extracted).unwrap(), b"payload");
        assert!(!tmp.path().join("a").exists());
        assert!(!tmp.path().join("c").exists());
        assert!(!tmp.path().join("d").exists());
    }

    #[tokio::test]
    async fn no_matching_artifact_names_is_fatal() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(&server, 1, json!([{"id": 100, "run_number": 5}])).await;
        mount_artifacts(
            &server,
            100,
            json!([artifact_json(201, "a"), artifact_json(202, "b")]),
        )
        .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        let err = download(&client, &repo(), "CI", 5, &names(&["x"]), tmp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoArtifactsFound));
    }

    #[tokio::test]
    async fn artifact_directories_are_named_after_the_artifact() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(&server, 1, json!([{"id": 100, "run_number": 5}])).await;
        mount_artifacts(&server, 100, json!([artifact_json(301, "build-output")])).await;

        let archive = build_archive(&[EntrySpec::file("bin/tool", b"ELF")]);
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/actions/artifacts/301/zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
            .mount(&server)
            .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        download(
            &client,
            &repo(),
            "CI",
            5,
            &names(&["build-output"]),
            tmp.path(),
        )
        .await
        .unwrap();

        assert!(tmp.path().join("build-output/bin/tool").is_file());
    }

    #[tokio::test]
    async fn corrupt_artifact_archives_are_fatal() {
        let server = MockServer::start().await;
        mount_workflows(&server, json!([{"id": 1, "name": "CI"}])).await;
        mount_runs(&server, 1, json!([{"id": 100, "run_number": 5}])).await;
        mount_artifacts(&server, 100, json!([artifact_json(401, "broken")])).await;

        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/actions/artifacts/401/zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a zip".to_vec()))
            .mount(&server)
            .await;

        let client = ActionsClient::with_base_url("t", server.uri()).unwrap();
        let tmp = tempdir().unwrap();

        let err = download(&client, &repo(), "CI", 5, &names(&["broken"]), tmp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ExtractionFailed(_)));
    }
}
