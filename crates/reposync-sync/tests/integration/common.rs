//! Shared test helpers for sync engine integration tests
//!
//! Provides an in-memory [`FakePlatform`] implementing the remote repository
//! port. It keeps repositories and files in memory, counts every call, and can
//! be scripted to fail or delay specific operations.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reposync_core::domain::{
    AccessToken, CreateRepository, Credentials, FileRevision, OwnerLogin, Project, ProjectFile,
    PutFileContent, PutFileOutcome, RemoteError, RemotePath, RemoteRepository, RepoName,
    RepositorySummary, RevisionToken,
};
use reposync_core::ports::{ICredentialProvider, IProjectStore, IRemoteConnector, IRemoteRepoClient};
use reposync_sync::{RetryPolicy, SyncOrchestrator};

// ============================================================================
// FakePlatform
// ============================================================================

#[derive(Default)]
struct State {
    login: Option<OwnerLogin>,
    repos: HashMap<String, RemoteRepository>,
    /// (repository full name, path) -> (content, revision number)
    files: HashMap<(String, String), (Vec<u8>, u64)>,
    next_revision: u64,
    connect_error: Option<RemoteError>,
    owner_error: Option<RemoteError>,
    create_error: Option<RemoteError>,
    repo_lookup_error: Option<RemoteError>,
    repo_lookup_override: Option<RemoteRepository>,
    file_lookup_failures: HashMap<String, VecDeque<RemoteError>>,
    put_failures: HashMap<String, VecDeque<RemoteError>>,
    put_delays: HashMap<String, Duration>,
    create_requests: Vec<CreateRepository>,
    put_requests: Vec<PutFileContent>,
    put_log: Vec<String>,
}

/// In-memory code-hosting platform
pub struct FakePlatform {
    state: Mutex<State>,
    connects: AtomicUsize,
    creates: AtomicUsize,
    repo_lookups: AtomicUsize,
    file_lookups: AtomicUsize,
    puts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn repo_key(owner: &OwnerLogin, name: &RepoName) -> String {
    format!("{}/{}", owner.as_str().to_ascii_lowercase(), name)
}

impl FakePlatform {
    /// A platform where the credentials authenticate as `login`
    pub fn new(login: &str) -> Arc<Self> {
        let state = State {
            login: Some(login.parse().unwrap()),
            ..State::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
            connects: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            repo_lookups: AtomicUsize::new(0),
            file_lookups: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // --- seeding -----------------------------------------------------------

    /// Adds an existing repository
    pub fn seed_repository(&self, owner: &str, name: &str) {
        let repo = repository(owner, name, false);
        self.state()
            .repos
            .insert(repo_key(&repo.owner, &repo.name), repo);
    }

    /// Adds an existing file to an existing repository
    pub fn seed_file(&self, owner: &str, name: &str, path: &str, content: &[u8]) {
        let mut state = self.state();
        state.next_revision += 1;
        let revision = state.next_revision;
        state.files.insert(
            (format!("{owner}/{name}").to_ascii_lowercase(), path.to_string()),
            (content.to_vec(), revision),
        );
    }

    // --- scripting ---------------------------------------------------------

    pub fn fail_connect(&self, err: RemoteError) {
        self.state().connect_error = Some(err);
    }

    pub fn fail_owner_lookup(&self, err: RemoteError) {
        self.state().owner_error = Some(err);
    }

    pub fn fail_create(&self, err: RemoteError) {
        self.state().create_error = Some(err);
    }

    pub fn fail_repo_lookup(&self, err: RemoteError) {
        self.state().repo_lookup_error = Some(err);
    }

    /// Makes repository lookups return `repo` regardless of the requested owner
    pub fn override_repo_lookup(&self, repo: RemoteRepository) {
        self.state().repo_lookup_override = Some(repo);
    }

    /// Queues errors returned by the next revision lookups of `path`
    pub fn fail_file_lookup(&self, path: &str, errors: Vec<RemoteError>) {
        self.state()
            .file_lookup_failures
            .insert(path.to_string(), errors.into());
    }

    /// Queues errors returned by the next writes of `path`
    pub fn fail_put(&self, path: &str, errors: Vec<RemoteError>) {
        self.state()
            .put_failures
            .insert(path.to_string(), errors.into());
    }

    /// Makes every write of `path` take `delay`
    pub fn delay_put(&self, path: &str, delay: Duration) {
        self.state().put_delays.insert(path.to_string(), delay);
    }

    // --- inspection --------------------------------------------------------

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn repo_lookups(&self) -> usize {
        self.repo_lookups.load(Ordering::SeqCst)
    }

    pub fn file_lookups(&self) -> usize {
        self.file_lookups.load(Ordering::SeqCst)
    }

    /// Number of write calls, including failed ones
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Highest number of writes observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Paths of successful writes, in completion order
    pub fn put_log(&self) -> Vec<String> {
        self.state().put_log.clone()
    }

    pub fn create_requests(&self) -> Vec<CreateRepository> {
        self.state().create_requests.clone()
    }

    /// Successful write requests, in completion order
    pub fn put_requests(&self) -> Vec<PutFileContent> {
        self.state().put_requests.clone()
    }

    pub fn file_content(&self, owner: &str, name: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .files
            .get(&(format!("{owner}/{name}").to_ascii_lowercase(), path.to_string()))
            .map(|(content, _)| content.clone())
    }

    fn token(revision: u64) -> RevisionToken {
        RevisionToken::new(format!("rev-{revision}")).unwrap()
    }
}

#[async_trait::async_trait]
impl IRemoteRepoClient for FakePlatform {
    async fn authenticated_owner(&self) -> Result<OwnerLogin, RemoteError> {
        let state = self.state();
        if let Some(err) = &state.owner_error {
            return Err(err.clone());
        }
        state
            .login
            .clone()
            .ok_or_else(|| RemoteError::unauthorized("no login"))
    }

    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.create_requests.push(request.clone());
        if let Some(err) = &state.create_error {
            return Err(err.clone());
        }
        let key = repo_key(&request.owner, &request.name);
        if state.repos.contains_key(&key) {
            return Err(RemoteError::name_conflict("name already exists on this account"));
        }
        let repo = RemoteRepository {
            created: true,
            ..repository(request.owner.as_str(), request.name.as_str(), true)
        };
        state.repos.insert(key, repo.clone());
        Ok(repo)
    }

    async fn get_repository(
        &self,
        owner: &OwnerLogin,
        name: &RepoName,
    ) -> Result<RemoteRepository, RemoteError> {
        self.repo_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = &state.repo_lookup_error {
            return Err(err.clone());
        }
        if let Some(repo) = &state.repo_lookup_override {
            return Ok(repo.clone());
        }
        state
            .repos
            .get(&repo_key(owner, name))
            .map(|r| RemoteRepository {
                created: false,
                ..r.clone()
            })
            .ok_or_else(|| RemoteError::not_found("Not Found"))
    }

    async fn list_repositories(&self, limit: u8) -> Result<Vec<RepositorySummary>, RemoteError> {
        let state = self.state();
        Ok(state
            .repos
            .values()
            .take(limit as usize)
            .map(|r| RepositorySummary {
                full_name: r.full_name(),
                html_url: r.html_url.clone(),
                private: false,
                description: None,
                updated_at: None,
            })
            .collect())
    }

    async fn get_file_revision(
        &self,
        repository: &RemoteRepository,
        path: &RemotePath,
        _branch: Option<&str>,
    ) -> Result<Option<FileRevision>, RemoteError> {
        self.file_lookups.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if let Some(err) = state
            .file_lookup_failures
            .get_mut(path.as_str())
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        let key = (repository.full_name().to_ascii_lowercase(), path.to_string());
        Ok(state.files.get(&key).map(|(content, revision)| FileRevision {
            token: Self::token(*revision),
            content: Some(content.clone()),
        }))
    }

    async fn put_file_content(
        &self,
        repository: &RemoteRepository,
        request: &PutFileContent,
    ) -> Result<PutFileOutcome, RemoteError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.state().put_delays.get(request.path.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.apply_put(repository, request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl FakePlatform {
    fn apply_put(
        &self,
        repository: &RemoteRepository,
        request: &PutFileContent,
    ) -> Result<PutFileOutcome, RemoteError> {
        let mut state = self.state();
        if let Some(err) = state
            .put_failures
            .get_mut(request.path.as_str())
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        let repo_name = repository.full_name().to_ascii_lowercase();
        if !state
            .repos
            .contains_key(&repo_key(&repository.owner, &repository.name))
        {
            return Err(RemoteError::not_found("Not Found"));
        }

        let key = (repo_name, request.path.to_string());
        let current = state.files.get(&key).map(|(_, rev)| Self::token(*rev));
        if current != request.revision {
            return Err(RemoteError::revision_mismatch(format!(
                "{} does not match",
                request.path
            )));
        }

        state.next_revision += 1;
        let revision = state.next_revision;
        state.files.insert(key, (request.content.clone(), revision));
        state.put_log.push(request.path.to_string());
        state.put_requests.push(request.clone());
        Ok(PutFileOutcome {
            token: Self::token(revision),
            commit_id: Some(format!("commit-{revision}")),
        })
    }
}

/// Hands out the same [`FakePlatform`] for any credentials
pub struct FakeConnector(pub Arc<FakePlatform>);

#[async_trait::async_trait]
impl IRemoteConnector for FakeConnector {
    async fn connect(
        &self,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn IRemoteRepoClient>, RemoteError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.0.state().connect_error.clone() {
            return Err(err);
        }
        Ok(Arc::clone(&self.0) as Arc<dyn IRemoteRepoClient>)
    }
}

// ============================================================================
// Store and credential fakes
// ============================================================================

/// Project store backed by a map
#[derive(Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<String, Project>>,
}

impl MemoryStore {
    pub fn with(key: &str, project: Project) -> Self {
        let store = Self::default();
        store
            .projects
            .lock()
            .unwrap()
            .insert(key.to_string(), project);
        store
    }
}

#[async_trait::async_trait]
impl IProjectStore for MemoryStore {
    async fn load_project(&self, key: &str) -> anyhow::Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no project stored under {key}"))
    }
}

/// Credential provider returning a fixed value
pub struct StaticCredentials(pub Option<Credentials>);

#[async_trait::async_trait]
impl ICredentialProvider for StaticCredentials {
    async fn credentials(&self) -> anyhow::Result<Option<Credentials>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn repository(owner: &str, name: &str, created: bool) -> RemoteRepository {
    RemoteRepository {
        owner: owner.parse().unwrap(),
        name: name.parse().unwrap(),
        html_url: format!("https://github.com/{owner}/{name}"),
        created,
        default_branch: Some("main".to_string()),
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(AccessToken::new("test-token").unwrap())
}

/// A project named `name` with one text file per entry of `files`
pub fn project(name: &str, files: &[&str]) -> Project {
    let files = files
        .iter()
        .map(|f| ProjectFile::from_text(*f, format!("content of {f}")))
        .collect();
    Project::new(name, Some("A test project".to_string()), None, files).unwrap()
}

/// Retry policy with short delays so paused-time tests stay readable
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(5))
}

pub fn orchestrator(platform: &Arc<FakePlatform>) -> SyncOrchestrator {
    SyncOrchestrator::new(Arc::new(FakeConnector(Arc::clone(platform))))
        .with_retry_policy(fast_retry())
}
