//! Repository and user endpoints

use reposync_core::domain::{CreateRepository, RemoteError};
use reposync_core::ports::IRemoteRepoClient;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn create_request(owner: &str, name: &str) -> CreateRepository {
    CreateRepository {
        owner: owner.parse().unwrap(),
        name: name.parse().unwrap(),
        description: Some("My site".to_string()),
        private: true,
        auto_init: true,
    }
}

#[tokio::test]
async fn test_get_authenticated_user_sends_auth_headers() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&server)
        .await;

    let login = client.get_authenticated_user().await.unwrap();
    assert_eq!(login.as_str(), "octocat");
}

#[tokio::test]
async fn test_create_repository_for_user() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_json(json!({
            "name": "site",
            "description": "My site",
            "private": true,
            "auto_init": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::repo_json("octocat", "site")))
        .expect(1)
        .mount(&server)
        .await;

    let repo = client
        .create_repository(&create_request("octocat", "site"), true)
        .await
        .unwrap();
    assert!(repo.created);
    assert_eq!(repo.full_name(), "octocat/site");
    assert_eq!(repo.html_url, "https://github.com/octocat/site");
}

#[tokio::test]
async fn test_create_repository_for_organization() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("POST"))
        .and(path("/orgs/my-org/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::repo_json("my-org", "site")))
        .expect(1)
        .mount(&server)
        .await;

    let repo = client
        .create_repository(&create_request("my-org", "site"), false)
        .await
        .unwrap();
    assert_eq!(repo.owner.as_str(), "my-org");
}

#[tokio::test]
async fn test_repo_client_picks_endpoint_from_login() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::repo_json("OctoCat", "site")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orgs/my-org/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::repo_json("my-org", "site")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "OctoCat"})))
        .expect(1)
        .named("login is fetched once")
        .mount(&server)
        .await;

    let client = common::connector(&server)
        .client_for(&common::credentials())
        .unwrap();
    // Logins compare case-insensitively
    client
        .create_repository(&create_request("octocat", "site"))
        .await
        .unwrap();
    client
        .create_repository(&create_request("my-org", "site"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_repository_name_conflict() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Repository creation failed.",
            "errors": [{
                "resource": "Repository",
                "code": "custom",
                "field": "name",
                "message": "name already exists on this account"
            }]
        })))
        .mount(&server)
        .await;

    let err = client
        .create_repository(&create_request("octocat", "site"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::NameConflict { .. }), "{err:?}");
}

#[tokio::test]
async fn test_create_repository_other_validation_error_is_not_a_conflict() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(common::error_json("Visibility can't be private")),
        )
        .mount(&server)
        .await;

    let err = client
        .create_repository(&create_request("octocat", "site"), true)
        .await
        .unwrap_err();
    assert!(
        matches!(err, RemoteError::Other { status: Some(422), .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_get_repository() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::repo_json("octocat", "site")))
        .mount(&server)
        .await;

    let repo = client
        .get_repository(&"octocat".parse().unwrap(), &"site".parse().unwrap())
        .await
        .unwrap();
    assert!(!repo.created);
    assert_eq!(repo.default_branch.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_get_repository_not_found() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_json("Not Found")))
        .mount(&server)
        .await;

    let err = client
        .get_repository(&"octocat".parse().unwrap(), &"missing".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[tokio::test]
async fn test_list_repositories_sorted_and_limited() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("sort", "updated"))
        .and(query_param("direction", "desc"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::repo_json("octocat", "newest"),
            common::repo_json("octocat", "older"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let repos = client.list_repositories(5).await.unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["octocat/newest", "octocat/older"]);
    assert!(repos[0].updated_at.is_some());
}

#[tokio::test]
async fn test_list_repositories_clamps_page_size() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_repositories(u8::MAX).await.unwrap().is_empty());
}
