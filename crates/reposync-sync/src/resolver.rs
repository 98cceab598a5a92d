//! Repository resolution
//!
//! Creation is always attempted first. Only the platform's name-collision
//! signal leads to a lookup, and only when the conflict policy allows reuse.
//! Every other failure is fatal and is never mistaken for a collision.

use std::sync::Arc;

use reposync_core::domain::{
    ConflictPolicy, CreateRepository, OwnerLogin, RemoteError, RemoteRepository, RepoName,
    ResolutionError,
};
use reposync_core::ports::IRemoteRepoClient;
use tracing::{debug, info, warn};

/// Resolves the target repository of a sync
pub struct RepositoryResolver {
    client: Arc<dyn IRemoteRepoClient>,
    auto_init: bool,
}

impl RepositoryResolver {
    pub fn new(client: Arc<dyn IRemoteRepoClient>) -> Self {
        Self {
            client,
            auto_init: true,
        }
    }

    /// Whether new repositories get an initial commit
    pub fn with_auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    /// Creates `owner/name`, or reuses it if it already exists and `on_conflict` allows
    ///
    /// # Returns
    /// The repository with `created = true` if this call created it
    ///
    /// # Errors
    /// - [`ResolutionError::RepositoryNameConflict`] if the name is taken and
    ///   may not be reused, or is not owned by `owner`
    /// - [`ResolutionError::Unauthorized`] if the credentials were rejected
    /// - [`ResolutionError::RemoteUnavailable`] for any other platform failure
    #[tracing::instrument(skip_all, fields(%owner, %name, ?on_conflict))]
    pub async fn resolve(
        &self,
        owner: &OwnerLogin,
        name: &RepoName,
        description: Option<&str>,
        is_private: bool,
        on_conflict: ConflictPolicy,
    ) -> Result<RemoteRepository, ResolutionError> {
        let request = CreateRepository {
            owner: owner.clone(),
            name: name.clone(),
            description: description.map(str::to_string),
            private: is_private,
            auto_init: self.auto_init,
        };

        let err = match self.client.create_repository(&request).await {
            Ok(repository) => {
                info!(full_name = %repository.full_name(), "Created repository");
                return Ok(repository);
            }
            Err(err) => err,
        };

        if !matches!(err, RemoteError::NameConflict { .. }) {
            warn!(error = %err, "Repository creation failed");
            return Err(resolution_failure(err));
        }

        let conflict = || ResolutionError::RepositoryNameConflict {
            owner: owner.to_string(),
            name: name.to_string(),
        };

        if on_conflict == ConflictPolicy::Fail {
            info!("Repository already exists and reuse is not allowed");
            return Err(conflict());
        }

        debug!("Repository already exists, looking it up for reuse");
        match self.client.get_repository(owner, name).await {
            Ok(existing) if existing.owner == *owner => {
                info!(full_name = %existing.full_name(), "Reusing existing repository");
                Ok(RemoteRepository {
                    created: false,
                    ..existing
                })
            }
            Ok(existing) => {
                warn!(actual_owner = %existing.owner, "Existing repository has a different owner");
                Err(conflict())
            }
            Err(e) => {
                warn!(error = %e, "Lookup of colliding repository failed");
                Err(conflict())
            }
        }
    }
}

/// Maps a fatal platform failure onto the resolution error taxonomy
pub(crate) fn resolution_failure(err: RemoteError) -> ResolutionError {
    match err {
        RemoteError::Unauthorized { message } => ResolutionError::Unauthorized { message },
        source => ResolutionError::RemoteUnavailable { source },
    }
}
