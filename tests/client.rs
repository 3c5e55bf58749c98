//! `GitHubClient` against a mock GitHub REST API.

use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

use workflow_retention::github::{ActionsApi as _, ApiError, GitHubClient};

const REPO: &str = "/repos/octo/repo";

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&server.uri(), Some(String::from("t0ken")), "octo/repo".parse().unwrap())
        .unwrap()
        .with_max_retries(1)
}

fn run_json(id: u64, workflow_id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "CI",
        "workflow_id": workflow_id,
        "status": "completed",
        "conclusion": "success",
        "created_at": "2024-05-01T10:00:00Z",
        "head_branch": "main",
        "pull_requests": []
    })
}

#[tokio::test]
async fn follows_pagination_links() {
    let server = MockServer::start().await;
    let next = format!("{}{REPO}/actions/workflows?per_page=100&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/workflows")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "workflows": [{ "id": 2, "name": "Docs", "path": ".github/workflows/docs.yml", "state": "active" }]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/workflows")))
        .and(query_param("per_page", "100"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!(r#"<{next}>; rel="next", <{next}>; rel="last""#).as_str())
                .set_body_json(json!({
                    "total_count": 2,
                    "workflows": [{ "id": 1, "name": "CI", "path": ".github/workflows/ci.yml", "state": "active" }]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workflows = client(&server).list_workflows().await.unwrap();
    assert_eq!(
        workflows.iter().map(|workflow| workflow.id).collect::<Vec<_>>(),
        [1, 2]
    );
    assert_eq!(workflows[1].filename(), "docs.yml");
}

#[tokio::test]
async fn lists_runs_of_a_workflow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/workflows/7/runs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "workflow_runs": [run_json(10, 7), run_json(11, 7)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client(&server).list_workflow_runs(7).await.unwrap();
    assert_eq!(runs.iter().map(|run| run.id).collect::<Vec<_>>(), [10, 11]);
}

#[tokio::test]
async fn lists_branch_names() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/branches")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main", "protected": true },
            { "name": "feature/x", "protected": false }
        ])))
        .mount(&server)
        .await;

    let names = client(&server).list_branch_names().await.unwrap();
    assert_eq!(names, ["main", "feature/x"]);
}

#[tokio::test]
async fn retries_once_after_primary_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/runs")))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/runs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "workflow_runs": [run_json(1, 1)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client(&server).list_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
}

#[tokio::test]
async fn gives_up_when_rate_limit_persists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/runs")))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server).list_runs().await.unwrap_err();
    assert!(err.to_string().ends_with("gave up after 1 retries"));
    assert_eq!(err.downcast_ref::<ApiError>().unwrap().status, 429);
}

#[tokio::test]
async fn does_not_retry_secondary_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/actions/runs")))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("retry-after", "60")
                .set_body_json(json!({ "message": "You have exceeded a secondary rate limit." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).list_runs().await.unwrap_err();
    let err = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(err.status, 403);
    assert_eq!(err.message, "You have exceeded a secondary rate limit.");
}

#[tokio::test]
async fn deletes_a_run() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{REPO}/actions/runs/42")))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_run(42).await.unwrap();
}

#[tokio::test]
async fn propagates_permanent_errors() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{REPO}/actions/runs/42")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).delete_run(42).await.unwrap_err();
    let err = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(err.method, "DELETE");
    assert_eq!(err.status, 404);
    assert_eq!(err.message, "Not Found");
}

#[tokio::test]
async fn falls_back_to_canonical_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{REPO}/branches")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).list_branch_names().await.unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().unwrap().message, "Unauthorized");
}
