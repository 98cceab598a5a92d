//! Error classification and rate-limit feedback

use std::sync::Arc;
use std::time::Duration;

use reposync_core::domain::{AccessToken, RemoteError};
use reposync_github::{AdaptiveRateLimiter, EndpointCategory, GitHubClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

async fn user_error(response: ResponseTemplate) -> RemoteError {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(response)
        .mount(&server)
        .await;
    client.get_authenticated_user().await.unwrap_err()
}

#[tokio::test]
async fn test_401_is_unauthorized() {
    let err = user_error(
        ResponseTemplate::new(401).set_body_json(common::error_json("Bad credentials")),
    )
    .await;
    assert_eq!(err, RemoteError::unauthorized("Bad credentials"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_403_without_rate_limit_signal_is_unauthorized() {
    let err = user_error(
        ResponseTemplate::new(403).set_body_json(common::error_json("Resource not accessible by integration")),
    )
    .await;
    assert!(matches!(err, RemoteError::Unauthorized { .. }), "{err:?}");
}

#[tokio::test]
async fn test_403_with_retry_after_is_rate_limited() {
    let err = user_error(
        ResponseTemplate::new(403)
            .insert_header("retry-after", "30")
            .set_body_json(common::error_json("You have exceeded a secondary rate limit")),
    )
    .await;
    assert_eq!(
        err,
        RemoteError::RateLimited {
            retry_after: Some(Duration::from_secs(30))
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_403_with_exhausted_quota_is_rate_limited() {
    let reset = chrono::Utc::now().timestamp() + 120;
    let err = user_error(
        ResponseTemplate::new(403)
            .insert_header("x-ratelimit-remaining", "0")
            .insert_header("x-ratelimit-reset", reset.to_string().as_str())
            .set_body_json(common::error_json("API rate limit exceeded for user ID 1.")),
    )
    .await;
    match err {
        RemoteError::RateLimited {
            retry_after: Some(wait),
        } => assert!(wait > Duration::from_secs(60) && wait <= Duration::from_secs(120)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let err = user_error(ResponseTemplate::new(429)).await;
    assert!(matches!(err, RemoteError::RateLimited { .. }), "{err:?}");
}

#[tokio::test]
async fn test_5xx_is_transient() {
    let err = user_error(ResponseTemplate::new(503)).await;
    assert!(matches!(err, RemoteError::TransientNetworkError { .. }), "{err:?}");
}

#[tokio::test]
async fn test_other_4xx_is_other_with_status() {
    let err = user_error(
        ResponseTemplate::new(400).set_body_json(common::error_json("Problems parsing JSON")),
    )
    .await;
    assert_eq!(err, RemoteError::other(Some(400), "Problems parsing JSON"));
}

#[tokio::test]
async fn test_malformed_success_body_is_other() {
    let err = user_error(ResponseTemplate::new(200).set_body_string("not json")).await;
    assert!(matches!(err, RemoteError::Other { status: None, .. }), "{err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Bind then drop a listener so the port is closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let client = GitHubClient::with_base_url(AccessToken::new("t").unwrap(), &uri).unwrap();

    let err = client.get_authenticated_user().await.unwrap_err();
    assert!(err.is_transient(), "{err:?}");
}

#[tokio::test]
async fn test_throttle_shrinks_shared_rate_limiter() {
    let (server, client) = common::setup_github_mock().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&server)
        .await;
    let limiter = Arc::new(AdaptiveRateLimiter::with_defaults());
    let client = client.with_rate_limiter(Arc::clone(&limiter));

    // Touch the bucket so its capacity is recorded before the throttle
    limiter.acquire(EndpointCategory::Core).await;
    let before = limiter.effective_capacity(EndpointCategory::Core).unwrap();

    let err = client.get_authenticated_user().await.unwrap_err();
    assert!(matches!(err, RemoteError::RateLimited { .. }));
    let after = limiter.effective_capacity(EndpointCategory::Core).unwrap();
    assert!(after < before, "capacity {before} -> {after}");
}
