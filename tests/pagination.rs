use github_pr_mcp::config::Config;
use github_pr_mcp::error::ToolError;
use github_pr_mcp::http::GitHubClient;
use github_pr_mcp::pagination::collect_pr_files;
use github_pr_mcp::pr_url::PullRequestRef;
use httpmock::{Method::GET, MockServer};
use serde_json::Value;

const FILES_PATH: &str = "/repos/acme/widgets/pulls/42/files";

fn pr() -> PullRequestRef {
    PullRequestRef {
        owner: "acme".into(),
        repo: "widgets".into(),
        number: "42".into(),
    }
}

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&Config::new("t").with_api_url(server.base_url())).unwrap()
}

fn file_page(start: usize, count: usize) -> Value {
    let items: Vec<Value> = (start..start + count)
        .map(|i| {
            serde_json::json!({
                "filename": format!("src/file_{}.rs", i),
                "additions": 1,
                "deletions": 0,
                "status": "modified",
                "patch": "@@ -0,0 +1 @@\n+x"
            })
        })
        .collect();
    Value::Array(items)
}

#[tokio::test]
async fn collects_all_pages_until_short_page() {
    let server = MockServer::start_async().await;
    let p1 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(FILES_PATH)
                .query_param("per_page", "100")
                .query_param("page", "1");
            then.status(200).json_body(file_page(0, 100));
        })
        .await;
    let p2 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(FILES_PATH)
                .query_param("per_page", "100")
                .query_param("page", "2");
            then.status(200).json_body(file_page(100, 100));
        })
        .await;
    let p3 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(FILES_PATH)
                .query_param("per_page", "100")
                .query_param("page", "3");
            then.status(200).json_body(file_page(200, 50));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 300, None).await.unwrap();
    assert_eq!(files.len(), 250);
    assert_eq!(files[0].filename, "src/file_0.rs");
    assert_eq!(files[249].filename, "src/file_249.rs");
    p1.assert_hits_async(1).await;
    p2.assert_hits_async(1).await;
    p3.assert_hits_async(1).await;
}

#[tokio::test]
async fn stops_at_cap_without_over_fetching() {
    let server = MockServer::start_async().await;
    let p1 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "1");
            then.status(200).json_body(file_page(0, 100));
        })
        .await;
    let p2 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "2");
            then.status(200).json_body(file_page(100, 100));
        })
        .await;
    let p3 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "3");
            then.status(200).json_body(file_page(200, 100));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 150, None).await.unwrap();
    assert_eq!(files.len(), 150);
    assert_eq!(files[149].filename, "src/file_149.rs");
    p1.assert_hits_async(1).await;
    p2.assert_hits_async(1).await;
    p3.assert_hits_async(0).await;
}

#[tokio::test]
async fn small_cap_sets_page_size() {
    let server = MockServer::start_async().await;
    let p1 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(FILES_PATH)
                .query_param("per_page", "5")
                .query_param("page", "1");
            then.status(200).json_body(file_page(0, 5));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 5, None).await.unwrap();
    assert_eq!(files.len(), 5);
    p1.assert_hits_async(1).await;
}

#[tokio::test]
async fn short_first_page_ends_in_one_call() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH);
            then.status(200).json_body(file_page(0, 7));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 50, None).await.unwrap();
    assert_eq!(files.len(), 7);
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn empty_first_page_returns_nothing() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH);
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 50, None).await.unwrap();
    assert!(files.is_empty());
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn zero_cap_issues_no_request() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH);
            then.status(200).json_body(file_page(0, 3));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 0, None).await.unwrap();
    assert!(files.is_empty());
    m.assert_hits_async(0).await;
}

#[tokio::test]
async fn upstream_failure_aborts_collection() {
    let server = MockServer::start_async().await;
    let _p1 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "1");
            then.status(200).json_body(file_page(0, 100));
        })
        .await;
    let _p2 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "2");
            then.status(502).body("bad gateway");
        })
        .await;

    let err = collect_pr_files(&client(&server), &pr(), 300, None).await.unwrap_err();
    match err {
        ToolError::Upstream { status, body } => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn known_total_avoids_trailing_empty_page() {
    let server = MockServer::start_async().await;
    let p1 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(FILES_PATH)
                .query_param("per_page", "100")
                .query_param("page", "1");
            then.status(200).json_body(file_page(0, 100));
        })
        .await;
    let p2 = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH).query_param("page", "2");
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 150, Some(100))
        .await
        .unwrap();
    assert_eq!(files.len(), 100);
    p1.assert_hits_async(1).await;
    p2.assert_hits_async(0).await;
}

#[tokio::test]
async fn known_total_of_zero_issues_no_request() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(FILES_PATH);
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let files = collect_pr_files(&client(&server), &pr(), 50, Some(0))
        .await
        .unwrap();
    assert!(files.is_empty());
    m.assert_hits_async(0).await;
}
