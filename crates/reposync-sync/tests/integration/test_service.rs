//! ProjectSyncService: store + credentials + engine

use std::sync::Arc;

use reposync_core::domain::{ConflictPolicy, RemoteError, SyncOptions, SyncOutcome};
use reposync_sync::ProjectSyncService;
use tokio_util::sync::CancellationToken;

use crate::common::{self, FakePlatform, MemoryStore, StaticCredentials};

fn service(platform: &Arc<FakePlatform>, with_credentials: bool) -> ProjectSyncService {
    let store = MemoryStore::with("site", common::project("site", &["a.txt", "b.txt", "c.txt"]));
    let credentials = StaticCredentials(with_credentials.then(common::credentials));
    ProjectSyncService::new(
        Arc::new(store),
        Arc::new(credentials),
        common::orchestrator(platform),
    )
}

fn reuse() -> SyncOptions {
    SyncOptions {
        on_conflict: ConflictPolicy::ReuseExisting,
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn test_sync_project_loads_and_syncs() {
    let platform = FakePlatform::new("octocat");

    let report = service(&platform, true)
        .sync_project("site", &SyncOptions::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.overall_outcome, SyncOutcome::Complete);
    assert_eq!(report.file_results.len(), 3);
}

#[tokio::test]
async fn test_missing_project_is_an_error() {
    let platform = FakePlatform::new("octocat");

    let err = service(&platform, true)
        .sync_project("nope", &SyncOptions::default(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("nope"));
    assert_eq!(platform.creates(), 0);
}

#[tokio::test]
async fn test_missing_credentials_is_an_error() {
    let platform = FakePlatform::new("octocat");

    let err = service(&platform, false)
        .sync_project("site", &SyncOptions::default(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No credentials"));
    assert_eq!(platform.connects(), 0);
}

#[tokio::test]
async fn test_sync_project_files_uploads_only_selection() {
    let platform = FakePlatform::new("octocat");

    let report = service(&platform, true)
        .sync_project_files(
            "site",
            &["c.txt".to_string(), "a.txt".to_string()],
            &SyncOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = report
        .file_results
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.txt", "c.txt"]);
    assert_eq!(platform.puts(), 2);
}

#[tokio::test]
async fn test_sync_project_files_rejects_unknown_file() {
    let platform = FakePlatform::new("octocat");

    let err = service(&platform, true)
        .sync_project_files(
            "site",
            &["missing.txt".to_string()],
            &SyncOptions::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("missing.txt"));
    assert_eq!(platform.creates(), 0);
}

#[tokio::test]
async fn test_retry_failed_reruns_only_failed_files() {
    let platform = FakePlatform::new("octocat");
    platform.fail_put("b.txt", vec![RemoteError::other(Some(422), "Invalid request")]);
    let service = service(&platform, true);

    let first = service
        .sync_project("site", &reuse(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.failed_file_names(), vec!["b.txt".to_string()]);

    let second = service
        .retry_failed("site", &first, &reuse(), CancellationToken::new())
        .await
        .unwrap()
        .expect("a retry was needed");
    assert_eq!(second.overall_outcome, SyncOutcome::Complete);
    assert_eq!(second.file_results.len(), 1);
    assert_eq!(second.file_results[0].file_name, "b.txt");

    let third = service
        .retry_failed("site", &second, &reuse(), CancellationToken::new())
        .await
        .unwrap();
    assert!(third.is_none());
}
