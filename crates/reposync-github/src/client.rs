//! GitHub REST API client
//!
//! Provides an authenticated HTTP client for the GitHub REST API. Handles
//! the standard headers, endpoint construction, proactive rate limiting and
//! the translation of error responses into [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reposync_core::domain::AccessToken;
//! use reposync_github::client::GitHubClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = GitHubClient::new(AccessToken::new("ghp_example")?)?;
//! let login = client.get_authenticated_user().await?;
//! println!("Hello, {login}");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reposync_core::config::RemoteConfig;
use reposync_core::domain::{AccessToken, RemoteError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::rate_limit::{retry_after_from_headers, AdaptiveRateLimiter, EndpointCategory};
use crate::GitHubError;

/// Base URL of the public GitHub REST API
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// REST API version requested on every call
const API_VERSION: &str = "2022-11-28";

/// Delay assumed when a throttle response names none
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

// ============================================================================
// Error payload
// ============================================================================

/// Error body returned by the GitHub REST API
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// All human-readable text in the body, lowercased, for signal matching
    fn haystack(&self) -> String {
        let mut text = self.message.to_lowercase();
        for detail in &self.errors {
            for part in [&detail.field, &detail.code, &detail.message].into_iter().flatten() {
                text.push(' ');
                text.push_str(&part.to_lowercase());
            }
        }
        text
    }

    /// The top-level message plus any detail messages
    fn summary(&self) -> String {
        let details: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|d| d.message.as_deref())
            .collect();
        match (self.message.is_empty(), details.is_empty()) {
            (true, true) => "no error message".to_string(),
            (false, true) => self.message.clone(),
            (true, false) => details.join("; "),
            (false, false) => format!("{} ({})", self.message, details.join("; ")),
        }
    }
}

/// Which kind of call produced a response, for context-dependent mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiCall {
    /// Reads and lookups
    Read,
    /// `POST /user/repos` and `POST /orgs/{org}/repos`
    CreateRepository,
    /// `PUT /repos/{owner}/{repo}/contents/{path}`
    WriteContents,
}

/// Translates an error response into a [`RemoteError`]
///
/// - 401 is `Unauthorized`
/// - 403 and 429 carrying rate-limit signals are `RateLimited`; other 403s are `Unauthorized`
/// - 404 is `NotFound`
/// - 409 on a contents write is `RevisionMismatch`
/// - 422 naming an existing repository is `NameConflict`
/// - 422 about the `sha` of a contents write is `RevisionMismatch`
/// - 5xx is `TransientNetworkError`
/// - anything else is `Other`
pub(crate) fn classify_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &ApiErrorBody,
    call: ApiCall,
) -> RemoteError {
    let text = body.haystack();
    let summary = body.summary();

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::unauthorized(summary),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after_from_headers(headers, DEFAULT_RETRY_AFTER);
            if status == StatusCode::TOO_MANY_REQUESTS
                || retry_after.is_some()
                || text.contains("rate limit")
            {
                RemoteError::RateLimited {
                    retry_after: retry_after.or(Some(DEFAULT_RETRY_AFTER)),
                }
            } else {
                RemoteError::unauthorized(summary)
            }
        }
        StatusCode::NOT_FOUND => RemoteError::not_found(summary),
        StatusCode::CONFLICT if call == ApiCall::WriteContents => {
            RemoteError::revision_mismatch(summary)
        }
        StatusCode::UNPROCESSABLE_ENTITY
            if call == ApiCall::CreateRepository && text.contains("already exists") =>
        {
            RemoteError::name_conflict(summary)
        }
        StatusCode::UNPROCESSABLE_ENTITY
            if call == ApiCall::WriteContents && text.contains("sha") =>
        {
            RemoteError::revision_mismatch(summary)
        }
        s if s.is_server_error() => RemoteError::transient(format!("{s}: {summary}")),
        s => RemoteError::other(Some(s.as_u16()), summary),
    }
}

/// Translates a transport failure into a [`RemoteError`]
pub(crate) fn classify_transport_error(err: &reqwest::Error) -> RemoteError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        RemoteError::transient(err.to_string())
    } else {
        RemoteError::other(None, err.to_string())
    }
}

// ============================================================================
// GitHubClient
// ============================================================================

/// HTTP client for GitHub REST API calls
///
/// Wraps `reqwest::Client` with the bearer token, the JSON media type, the
/// API version header and a user agent. Optionally integrates with an
/// [`AdaptiveRateLimiter`] shared across clients.
///
/// The client never retries; retry policy belongs to the sync engine.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    token: AccessToken,
    rate_limiter: Option<Arc<AdaptiveRateLimiter>>,
}

impl GitHubClient {
    /// Creates a client for the public GitHub API with default settings
    pub fn new(token: AccessToken) -> Result<Self, GitHubError> {
        Self::from_config(token, &RemoteConfig::default())
    }

    /// Creates a client with a custom base URL (GitHub Enterprise, tests)
    pub fn with_base_url(token: AccessToken, base_url: &str) -> Result<Self, GitHubError> {
        let config = RemoteConfig {
            api_base_url: base_url.to_string(),
            ..RemoteConfig::default()
        };
        Self::from_config(token, &config)
    }

    /// Creates a client from the `remote` configuration section
    pub fn from_config(token: AccessToken, config: &RemoteConfig) -> Result<Self, GitHubError> {
        let base_url = Url::parse(config.api_base_url.trim_end_matches('/'))
            .map_err(|e| GitHubError::InvalidBaseUrl(format!("{}: {e}", config.api_base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidBaseUrl(config.api_base_url.clone()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
            rate_limiter: None,
        })
    }

    /// Attaches a shared rate limiter
    pub fn with_rate_limiter(mut self, limiter: Arc<AdaptiveRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn rate_limiter(&self) -> Option<&Arc<AdaptiveRateLimiter>> {
        self.rate_limiter.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments
    ///
    /// Each segment is percent-encoded individually, so a segment may not
    /// smuggle in a `/`. Pass multi-level file paths segment by segment.
    pub fn endpoint<'a, I>(&self, segments: I) -> Result<Url, RemoteError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::other(None, "API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Creates an authenticated request builder for `url`
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
    }

    /// Sends a request and returns the successful response
    ///
    /// Waits for the rate limiter first, feeds throttle and success signals
    /// back into it, and classifies error responses.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        category: EndpointCategory,
        call: ApiCall,
    ) -> Result<Response, RemoteError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(category).await;
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "GitHub response");

        if status.is_success() {
            if let Some(limiter) = &self.rate_limiter {
                limiter.on_success(category);
            }
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        let error = classify_error(status, &headers, &body, call);

        if let RemoteError::RateLimited { retry_after } = &error {
            warn!(%category, status = status.as_u16(), ?retry_after, "GitHub rate limit hit");
            if let Some(limiter) = &self.rate_limiter {
                limiter.on_throttle(category, *retry_after);
            }
        }

        Err(error)
    }

    /// Sends a request and decodes a JSON body from the successful response
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        category: EndpointCategory,
        call: ApiCall,
    ) -> Result<T, RemoteError> {
        let response = self.send(request, category, call).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::other(None, format!("invalid response body: {e}")))
    }
}
