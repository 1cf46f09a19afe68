use github_pr_mcp::config::Config;
use github_pr_mcp::error::ToolError;
use github_pr_mcp::http::{GitHubClient, ACCEPT_DIFF};
use httpmock::{Method::GET, MockServer};

#[tokio::test]
async fn json_requests_carry_bearer_and_github_media_type() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/user")
                .header("Authorization", "Bearer secret")
                .header("Accept", "application/vnd.github+json")
                .header_exists("User-Agent");
            then.status(200)
                .json_body(serde_json::json!({"login": "alice"}));
        })
        .await;

    let client =
        GitHubClient::new(&Config::new("secret").with_api_url(server.base_url())).unwrap();
    let v: serde_json::Value = client.get_json("/user").await.unwrap();
    assert_eq!(v["login"], "alice");
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn text_requests_use_requested_accept() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/o/r/pulls/1")
                .header("Accept", ACCEPT_DIFF);
            then.status(200).body("diff --git a/x b/x\n");
        })
        .await;

    let client = GitHubClient::new(&Config::new("t").with_api_url(server.base_url())).unwrap();
    let diff = client
        .get_text("/repos/o/r/pulls/1", ACCEPT_DIFF)
        .await
        .unwrap();
    assert_eq!(diff, "diff --git a/x b/x\n");
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn non_success_is_upstream_error_without_retry() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/repos");
            then.status(500).body("{\"message\":\"boom\"}");
        })
        .await;

    let client = GitHubClient::new(&Config::new("t").with_api_url(server.base_url())).unwrap();
    let err = client
        .get_json::<serde_json::Value>("/user/repos")
        .await
        .unwrap_err();
    match err {
        ToolError::Upstream { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "{\"message\":\"boom\"}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/repos");
            then.status(200).body("not json");
        })
        .await;

    let client = GitHubClient::new(&Config::new("t").with_api_url(server.base_url())).unwrap();
    let err = client
        .get_json::<serde_json::Value>("/user/repos")
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Decode(_)));
}
