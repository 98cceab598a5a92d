//! Repository contents endpoints
//!
//! - `GET /repos/{owner}/{repo}/contents/{path}` - current blob SHA and content
//! - `PUT /repos/{owner}/{repo}/contents/{path}` - create or update one file
//!
//! File content travels base64-encoded in both directions. The blob SHA is
//! the revision token: it must accompany any update of an existing path.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reposync_core::domain::{
    Committer, FileRevision, PutFileContent, PutFileOutcome, RemoteError, RemotePath,
    RemoteRepository, RevisionToken,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{ApiCall, GitHubClient};
use crate::rate_limit::EndpointCategory;

// ============================================================================
// API payloads
// ============================================================================

/// Body of a successful contents GET for a file
#[derive(Debug, Deserialize)]
struct FileContentResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// A contents GET returns an object for files and an array for directories
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    File(FileContentResponse),
    Directory(Vec<serde_json::Value>),
}

#[derive(Debug, Serialize)]
struct CommitterBody<'a> {
    name: &'a str,
    email: &'a str,
}

impl<'a> From<&'a Committer> for CommitterBody<'a> {
    fn from(c: &'a Committer) -> Self {
        Self {
            name: &c.name,
            email: &c.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<CommitterBody<'a>>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsBlob,
    #[serde(default)]
    commit: Option<PutContentsCommit>,
}

#[derive(Debug, Deserialize)]
struct PutContentsBlob {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsCommit {
    sha: String,
}

// ============================================================================
// Encoding helpers
// ============================================================================

/// Encodes file content for transport
pub fn encode_content(content: &[u8]) -> String {
    STANDARD.encode(content)
}

/// Decodes content returned by the contents API
///
/// GitHub wraps the base64 payload at 60 columns, so whitespace is removed
/// before decoding.
pub fn decode_content(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}

fn token_from_sha(sha: String) -> Result<RevisionToken, RemoteError> {
    RevisionToken::new(sha)
        .map_err(|e| RemoteError::other(None, format!("unexpected sha in response: {e}")))
}

// ============================================================================
// Endpoints
// ============================================================================

impl GitHubClient {
    fn contents_url(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
    ) -> Result<Url, RemoteError> {
        let base = [
            "repos",
            repository.owner.as_str(),
            repository.name.as_str(),
            "contents",
        ];
        self.endpoint(base.into_iter().chain(path.segments()))
    }

    /// Retrieves the current revision of a file
    ///
    /// # Returns
    /// `Ok(None)` on 404. The decoded content is included when GitHub
    /// returned it inline (files up to 1 MB).
    pub async fn get_file_revision(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
        branch: Option<&str>,
    ) -> Result<Option<FileRevision>, RemoteError> {
        let mut url = self.contents_url(repository, path)?;
        if let Some(branch) = branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        let result: Result<ContentsResponse, RemoteError> = self
            .send_json(self.request(Method::GET, url), EndpointCategory::Core, ApiCall::Read)
            .await;

        let file = match result {
            Ok(ContentsResponse::File(file)) => file,
            Ok(ContentsResponse::Directory(_)) => {
                return Err(RemoteError::other(
                    None,
                    format!("{path} is a directory in {}", repository.full_name()),
                ));
            }
            Err(RemoteError::NotFound { .. }) => {
                debug!(%path, "File does not exist remotely");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if file.kind != "file" {
            return Err(RemoteError::other(
                None,
                format!("{path} is a {} in {}", file.kind, repository.full_name()),
            ));
        }

        let content = match (file.encoding.as_deref(), file.content.as_deref()) {
            (Some("base64"), Some(encoded)) => match decode_content(encoded) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    debug!(%path, error = %e, "Remote content is not valid base64");
                    None
                }
            },
            _ => None,
        };

        Ok(Some(FileRevision {
            token: token_from_sha(file.sha)?,
            content,
        }))
    }

    /// Creates or updates one file as a single commit
    pub async fn put_file_content(
        &self,
        repository: &RemoteRepository,
        request: &PutFileContent,
    ) -> Result<PutFileOutcome, RemoteError> {
        let url = self.contents_url(repository, &request.path)?;
        let body = PutContentsBody {
            message: &request.message,
            content: encode_content(&request.content),
            sha: request.revision.as_ref().map(RevisionToken::as_str),
            branch: request.branch.as_deref(),
            committer: request.committer.as_ref().map(CommitterBody::from),
        };

        debug!(
            path = %request.path,
            bytes = request.content.len(),
            update = request.revision.is_some(),
            "Writing file contents"
        );
        let response: PutContentsResponse = self
            .send_json(
                self.request(Method::PUT, url).json(&body),
                EndpointCategory::ContentWrite,
                ApiCall::WriteContents,
            )
            .await?;

        Ok(PutFileOutcome {
            token: token_from_sha(response.content.sha)?,
            commit_id: response.commit.map(|c| c.sha),
        })
    }
}
