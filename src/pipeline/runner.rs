//! Pipeline runner: owns one background task per active project.
//!
//! Runs are spawned off the caller's path so observers are never blocked. A
//! project has at most one active run; a second start or resume is refused
//! with [`ApiError::RunInProgress`]. Every task is supervised: if the driver
//! errors or panics, the failure is written to the store like any other
//! terminal outcome. The supervisor drops its registry entry when the run
//! ends, so the registry only ever holds live runs.

use crate::arbiter::{CandidateArbiter, SelectionCheck};
use crate::error::{ApiError, GenerationFailure};
use crate::pipeline::driver::PipelineDriver;
use crate::pipeline::plan::{PipelineSettings, RunOutcome, StartRequest};
use crate::progress::ProgressStore;
use crate::project::ProjectStatus;
use crate::provider::{Credential, GenerationClient, OpenAiCompatibleClient, ProviderConfig};
use crate::types::ProjectId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Builds the generation client for one run from that run's credential.
pub type ClientFactory =
    Arc<dyn Fn(&Credential) -> Result<Arc<dyn GenerationClient>, GenerationFailure> + Send + Sync>;

/// Flips to `true` once the run's final state is in the store.
type RunDone = watch::Receiver<bool>;

pub struct PipelineRunner {
    store: Arc<ProgressStore>,
    settings: PipelineSettings,
    selection_check: SelectionCheck,
    clients: ClientFactory,
    active: Arc<Mutex<HashMap<ProjectId, RunDone>>>,
}

impl PipelineRunner {
    pub fn new(
        store: Arc<ProgressStore>,
        settings: PipelineSettings,
        selection_check: SelectionCheck,
        clients: ClientFactory,
    ) -> Self {
        Self {
            store,
            settings,
            selection_check,
            clients,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runner whose runs talk to an OpenAI-compatible endpoint.
    pub fn with_provider(
        store: Arc<ProgressStore>,
        settings: PipelineSettings,
        selection_check: SelectionCheck,
        provider: ProviderConfig,
    ) -> Self {
        let clients: ClientFactory = Arc::new(
            move |credential: &Credential| -> Result<Arc<dyn GenerationClient>, GenerationFailure> {
                let client = OpenAiCompatibleClient::new(&provider, credential.clone())?;
                Ok(Arc::new(client))
            },
        );
        Self::new(store, settings, selection_check, clients)
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Create a project for `request` and start running it in the background.
    pub fn start(&self, request: StartRequest) -> Result<ProjectId, ApiError> {
        request.validate()?;
        let client = (self.clients)(&request.credential)?;
        let id = self.store.create(&request.title, request.target_length)?;
        info!(project_id = %id, title = %request.title.trim(), chapters = request.target_length, "project queued");
        self.spawn_run(id, request.model, client)?;
        Ok(id)
    }

    /// Restart a stalled project from its persisted position.
    pub fn resume(
        &self,
        id: ProjectId,
        model: String,
        credential: &Credential,
    ) -> Result<(), ApiError> {
        let project = self.store.get(id)?;
        if project.status.is_terminal() {
            return Err(ApiError::NotResumable {
                id,
                reason: format!("project is already {}", project.status.label()),
            });
        }
        let client = (self.clients)(credential)?;
        info!(project_id = %id, position = project.position, target = project.target_length, "resuming project");
        self.spawn_run(id, model, client)
    }

    pub fn is_active(&self, id: ProjectId) -> bool {
        self.active.lock().contains_key(&id)
    }

    pub fn active_runs(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.active.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Wait for the run of `id` to end and report how it ended.
    ///
    /// The outcome is read back from the store, so a run that already ended
    /// (and left the registry) is reported the same way. A project that is
    /// not running and not terminal has no outcome and is an error.
    pub async fn wait(&self, id: ProjectId) -> Result<RunOutcome, ApiError> {
        let done = self.active.lock().get(&id).cloned();
        if let Some(mut done) = done {
            // A closed channel means the supervisor is gone, which also ends the run.
            let _ = done.wait_for(|finished| *finished).await;
        }

        let project = self.store.get(id)?;
        match project.status {
            ProjectStatus::Completed => Ok(RunOutcome::Completed),
            ProjectStatus::Failed { reason } => Ok(RunOutcome::Failed {
                unit: project.position + 1,
                reason,
            }),
            other => Err(ApiError::PipelineFailed(format!(
                "project {} has no finished run (status: {})",
                id,
                other.label()
            ))),
        }
    }

    fn spawn_run(
        &self,
        id: ProjectId,
        model: String,
        client: Arc<dyn GenerationClient>,
    ) -> Result<(), ApiError> {
        let mut active = self.active.lock();
        if active.contains_key(&id) {
            return Err(ApiError::RunInProgress(id));
        }

        let arbiter = Arc::new(CandidateArbiter::new(client.clone(), self.selection_check));
        let driver = PipelineDriver::new(self.store.clone(), client, arbiter, self.settings);
        let store = self.store.clone();
        let registry = self.active.clone();
        let (finished, done) = watch::channel(false);

        // The registry lock is held until the entry is inserted, so the
        // supervisor cannot remove it first.
        tokio::spawn(async move {
            let run = tokio::spawn(async move { driver.run(id, &model).await });
            let result = match run.await {
                Ok(result) => result,
                Err(join_err) => Err(ApiError::PipelineFailed(format!(
                    "run task ended abnormally: {}",
                    join_err
                ))),
            };
            match result {
                Ok(RunOutcome::Completed) => info!(project_id = %id, "run finished"),
                Ok(RunOutcome::Failed { unit, reason }) => {
                    warn!(project_id = %id, unit, reason = %reason, "run failed")
                }
                Err(err) => {
                    error!(project_id = %id, error = %err, "run aborted");
                    record_abort(&store, id, &err);
                }
            }
            registry.lock().remove(&id);
            finished.send_replace(true);
        });
        active.insert(id, done);
        Ok(())
    }
}

/// Best-effort: mark the project failed after a run error. Projects that were
/// never runnable (already terminal) are left untouched.
fn record_abort(store: &ProgressStore, id: ProjectId, err: &ApiError) {
    if matches!(err, ApiError::NotResumable { .. } | ApiError::ProjectNotFound(_)) {
        return;
    }
    let reason = match err {
        ApiError::StorageError(inner) => format!("storage error: {}", inner),
        other => other.to_string(),
    };
    if let Err(write_err) = store.set_status(id, ProjectStatus::failed(reason)) {
        warn!(project_id = %id, error = %write_err, "could not record run failure");
    }
}
