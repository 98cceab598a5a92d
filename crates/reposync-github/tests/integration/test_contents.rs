//! Contents endpoints: revision lookup and file writes

use reposync_core::domain::{Committer, PutFileContent, RemoteError, RemotePath, RevisionToken};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn remote_path(p: &str) -> RemotePath {
    RemotePath::normalize(p).unwrap()
}

fn put_request(p: &str, content: &[u8], revision: Option<&str>) -> PutFileContent {
    PutFileContent {
        path: remote_path(p),
        content: content.to_vec(),
        revision: revision.map(|r| RevisionToken::new(r.to_string()).unwrap()),
        message: format!("Update {p}"),
        committer: None,
        branch: None,
    }
}

#[tokio::test]
async fn test_get_file_revision_decodes_content() {
    let (server, client) = common::setup_github_mock().await;
    let body = b"<html><body>Hello from a file long enough to wrap the base64 payload</body></html>";
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/index.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::file_json("index.html", "abc123", body)),
        )
        .mount(&server)
        .await;

    let revision = client
        .get_file_revision(
            &common::remote_repository("octocat", "site"),
            &remote_path("index.html"),
            None,
        )
        .await
        .unwrap()
        .expect("file exists");
    assert_eq!(revision.token.as_str(), "abc123");
    assert_eq!(revision.content.as_deref(), Some(&body[..]));
}

#[tokio::test]
async fn test_get_file_revision_absent_is_none() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/new.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_json("Not Found")))
        .mount(&server)
        .await;

    let revision = client
        .get_file_revision(
            &common::remote_repository("octocat", "site"),
            &remote_path("new.txt"),
            None,
        )
        .await
        .unwrap();
    assert!(revision.is_none());
}

#[tokio::test]
async fn test_get_file_revision_server_error_is_not_absence() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/a.txt"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client
        .get_file_revision(
            &common::remote_repository("octocat", "site"),
            &remote_path("a.txt"),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_transient(), "{err:?}");
}

#[tokio::test]
async fn test_get_file_revision_nested_path_and_branch() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/assets/img/my%20logo.svg"))
        .and(query_param("ref", "gh-pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "assets/img/my logo.svg",
            "def456",
            b"<svg/>",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let revision = client
        .get_file_revision(
            &common::remote_repository("octocat", "site"),
            &remote_path("assets\\img\\my logo.svg"),
            Some("gh-pages"),
        )
        .await
        .unwrap();
    assert_eq!(revision.unwrap().token.as_str(), "def456");
}

#[tokio::test]
async fn test_get_file_revision_directory_is_an_error() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "file", "name": "logo.svg", "path": "assets/logo.svg", "sha": "abc"}
        ])))
        .mount(&server)
        .await;

    let err = client
        .get_file_revision(
            &common::remote_repository("octocat", "site"),
            &remote_path("assets"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Other { .. }));
    assert!(err.to_string().contains("directory"));
}

#[tokio::test]
async fn test_put_file_content_create_omits_sha() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/index.html"))
        .and(body_partial_json(json!({
            "message": "Update index.html",
            "content": "PGgxPmhpPC9oMT4="
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(common::put_response_json("index.html", "new-sha")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client
        .put_file_content(
            &common::remote_repository("octocat", "site"),
            &put_request("index.html", b"<h1>hi</h1>", None),
        )
        .await
        .unwrap();
    assert_eq!(outcome.token.as_str(), "new-sha");
    assert_eq!(outcome.commit_id.as_deref(), Some("commit-new-sha"));

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("sha").is_none());
}

#[tokio::test]
async fn test_put_file_content_update_sends_sha_committer_and_branch() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/index.html"))
        .and(body_partial_json(json!({
            "sha": "old-sha",
            "branch": "main",
            "committer": { "name": "Ada", "email": "ada@example.com" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::put_response_json("index.html", "new-sha")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = PutFileContent {
        committer: Some(Committer::new("Ada", "ada@example.com").unwrap()),
        branch: Some("main".to_string()),
        ..put_request("index.html", b"<h1>hi</h1>", Some("old-sha"))
    };
    client
        .put_file_content(&common::remote_repository("octocat", "site"), &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_file_content_conflict_is_revision_mismatch() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/index.html"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(common::error_json("index.html does not match old-sha")),
        )
        .mount(&server)
        .await;

    let err = client
        .put_file_content(
            &common::remote_repository("octocat", "site"),
            &put_request("index.html", b"x", Some("old-sha")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::RevisionMismatch { .. }), "{err:?}");
}

#[tokio::test]
async fn test_put_file_content_missing_sha_is_revision_mismatch() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/index.html"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(common::error_json("Invalid request.\n\n\"sha\" wasn't supplied.")),
        )
        .mount(&server)
        .await;

    let err = client
        .put_file_content(
            &common::remote_repository("octocat", "site"),
            &put_request("index.html", b"x", None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::RevisionMismatch { .. }), "{err:?}");
}
