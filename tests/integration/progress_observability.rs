//! Observer behavior while a run is in flight.

use crate::integration::StoryClient;
use scrivener::arbiter::SelectionCheck;
use scrivener::error::{GenerationFailure, StorageError};
use scrivener::pipeline::{ClientFactory, PipelineRunner, PipelineSettings, RunOutcome, StartRequest};
use scrivener::progress::{ProgressObserver, ProgressStore, ProgressView};
use scrivener::project::ProjectStatus;
use scrivener::provider::{Credential, GenerationClient};
use scrivener::types::ProjectId;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn paced_runner(store: Arc<ProgressStore>) -> PipelineRunner {
    let clients: ClientFactory = Arc::new(
        |_credential: &Credential| -> Result<Arc<dyn GenerationClient>, GenerationFailure> {
            Ok(Arc::new(StoryClient::new()))
        },
    );
    let settings = PipelineSettings {
        candidate_count: 3,
        dispatch_pacing: Duration::from_secs(1),
        unit_pacing: Duration::from_secs(1),
    };
    PipelineRunner::new(store, settings, SelectionCheck::Trust, clients)
}

#[tokio::test(start_paused = true)]
async fn observer_sees_monotonic_progress_until_completion() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ProgressStore::open(dir.path().join("store")).unwrap());
    let runner = paced_runner(store.clone());

    let id = runner
        .start(StartRequest {
            title: "Observed".to_string(),
            target_length: 2,
            model: "m".to_string(),
            credential: Credential::new("k"),
        })
        .unwrap();

    let observer = ProgressObserver::new(store.clone(), Duration::from_millis(100));
    let mut seen: Vec<ProgressView> = Vec::new();
    let mut statuses: Vec<ProjectStatus> = Vec::new();
    let last = observer
        .follow(id, |project| {
            seen.push(ProgressView::from_project(project));
            statuses.push(project.status.clone());
        })
        .await
        .unwrap();

    assert_eq!(runner.wait(id).await.unwrap(), RunOutcome::Completed);
    assert_eq!(last.status, ProjectStatus::Completed);
    assert!(statuses.contains(&ProjectStatus::Generating { unit: 1 }));
    assert!(statuses.contains(&ProjectStatus::Generating { unit: 2 }));
    assert_eq!(statuses.last(), Some(&ProjectStatus::Completed));

    for pair in seen.windows(2) {
        assert!(pair[0].position <= pair[1].position);
        assert!(pair[0].fraction() <= pair[1].fraction());
    }
    let final_view = seen.last().unwrap();
    assert!(final_view.terminal);
    assert_eq!(final_view.progress_label(), "2/2 chapters");
}

#[tokio::test]
async fn observer_reports_unknown_project() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ProgressStore::open(dir.path().join("store")).unwrap());
    let observer = ProgressObserver::new(store, Duration::from_millis(5));
    let result = observer.follow(ProjectId::new(404), |_| {}).await;
    assert!(matches!(result, Err(StorageError::ProjectNotFound(_))));
}
