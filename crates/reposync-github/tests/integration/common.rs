//! Shared test helpers for GitHub API integration tests
//!
//! Provides wiremock-based mock server setup and canned GitHub payloads.
//! Each setup helper returns the server together with a client pointing at it.

#![allow(dead_code)]

use reposync_core::config::{RateLimitingConfig, RemoteConfig};
use reposync_core::domain::{AccessToken, Credentials, RemoteRepository};
use reposync_github::{GitHubClient, GitHubConnector};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";

pub fn token() -> AccessToken {
    AccessToken::new(TOKEN).unwrap()
}

pub fn credentials() -> Credentials {
    Credentials::new(token())
}

/// Starts a mock server and returns a client pointing at it
pub async fn setup_github_mock() -> (MockServer, GitHubClient) {
    let server = MockServer::start().await;
    let client = GitHubClient::with_base_url(token(), &server.uri()).unwrap();
    (server, client)
}

/// A connector (with its own rate limiter) pointing at `server`
pub fn connector(server: &MockServer) -> GitHubConnector {
    let remote = RemoteConfig {
        api_base_url: server.uri(),
        ..RemoteConfig::default()
    };
    GitHubConnector::from_config(&remote, &RateLimitingConfig::default())
}

/// Mounts `GET /user` returning `login`
pub async fn mount_user(server: &MockServer, login: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": login,
            "id": 1,
            "type": "User"
        })))
        .mount(server)
        .await;
}

/// Repository payload as returned by the repos endpoints
pub fn repo_json(owner: &str, name: &str) -> Value {
    json!({
        "id": 1296269,
        "name": name,
        "full_name": format!("{owner}/{name}"),
        "html_url": format!("https://github.com/{owner}/{name}"),
        "private": false,
        "description": "Created with reposync",
        "default_branch": "main",
        "updated_at": "2024-03-01T12:00:00Z",
        "owner": { "login": owner, "id": 1 }
    })
}

/// File payload as returned by a contents GET
pub fn file_json(path: &str, sha: &str, content: &[u8]) -> Value {
    json!({
        "type": "file",
        "encoding": "base64",
        "name": path.rsplit('/').next().unwrap_or(path),
        "path": path,
        "sha": sha,
        "size": content.len(),
        "content": wrap_base64(&reposync_github::contents::encode_content(content)),
    })
}

/// Response of a successful contents PUT
pub fn put_response_json(path: &str, sha: &str) -> Value {
    json!({
        "content": { "name": path, "path": path, "sha": sha },
        "commit": { "sha": format!("commit-{sha}"), "message": "Update" }
    })
}

/// GitHub error body
pub fn error_json(message: &str) -> Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    })
}

pub fn remote_repository(owner: &str, name: &str) -> RemoteRepository {
    RemoteRepository {
        owner: owner.parse().unwrap(),
        name: name.parse().unwrap(),
        html_url: format!("https://github.com/{owner}/{name}"),
        created: false,
        default_branch: Some("main".to_string()),
    }
}

/// Wraps base64 at 60 columns like GitHub does
fn wrap_base64(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(60)
        .map(|c| format!("{}\n", String::from_utf8_lossy(c)))
        .collect()
}
