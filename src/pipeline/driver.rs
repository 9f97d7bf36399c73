//! Pipeline driver: the per-project state machine.
//!
//! For each chapter from `position + 1` to the target it records
//! `generating(k)`, fans out draft requests, records `selecting(k)`, asks the
//! arbiter for one draft, then appends the labeled chapter and advances the
//! position in a single store update. The first unrecoverable failure is
//! recorded as `failed(reason)` and ends the run; no partial chapter is ever
//! appended.

use crate::arbiter::Arbiter;
use crate::error::{ApiError, GenerationFailure};
use crate::pipeline::plan::{PipelineSettings, RunOutcome};
use crate::progress::ProgressStore;
use crate::project::{
    format_unit, ProjectStatus, DRAFT_FAILURE_REASON, SELECTION_FAILURE_REASON,
};
use crate::prompt;
use crate::provider::GenerationClient;
use crate::types::ProjectId;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PipelineDriver {
    store: Arc<ProgressStore>,
    client: Arc<dyn GenerationClient>,
    arbiter: Arc<dyn Arbiter>,
    settings: PipelineSettings,
}

impl PipelineDriver {
    pub fn new(
        store: Arc<ProgressStore>,
        client: Arc<dyn GenerationClient>,
        arbiter: Arc<dyn Arbiter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            client,
            arbiter,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the project from its persisted position to completion or first failure.
    ///
    /// Returns `Err` only when the store itself fails or the project cannot be
    /// run; generation and selection failures are recorded and reported as
    /// [`RunOutcome::Failed`].
    pub async fn run(&self, id: ProjectId, model: &str) -> Result<RunOutcome, ApiError> {
        let project = self.store.get(id)?;
        if project.status.is_terminal() {
            return Err(ApiError::NotResumable {
                id,
                reason: format!("project is already {}", project.status.label()),
            });
        }

        let title = project.title.clone();
        let target = project.target_length;
        let mut document = project.document();
        info!(
            project_id = %id,
            title = %title,
            from_unit = project.position + 1,
            target,
            "pipeline run started"
        );

        for unit in (project.position + 1)..=target {
            let position = unit - 1;
            self.persist(id, position, ProjectStatus::Generating { unit }, String::new())
                .await?;

            let drafts = self.collect_drafts(id, model, &title, unit, &document).await;
            if drafts.len() < self.settings.candidate_count {
                warn!(
                    project_id = %id,
                    unit,
                    succeeded = drafts.len(),
                    required = self.settings.candidate_count,
                    "not enough drafts, stopping run"
                );
                return self.fail(id, position, unit, DRAFT_FAILURE_REASON).await;
            }

            self.persist(id, position, ProjectStatus::Selecting { unit }, String::new())
                .await?;
            let chosen = match self
                .arbiter
                .select_best(model, &title, unit, &document, &drafts)
                .await
            {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(project_id = %id, unit, error = %GenerationFailure::EmptyResponse, "selection failed");
                    return self.fail(id, position, unit, SELECTION_FAILURE_REASON).await;
                }
                Err(err) => {
                    warn!(project_id = %id, unit, error = %err, "selection failed");
                    return self.fail(id, position, unit, SELECTION_FAILURE_REASON).await;
                }
            };

            let segment = format_unit(unit, &chosen);
            let status = if unit < target {
                ProjectStatus::Running
            } else {
                ProjectStatus::Completed
            };
            self.persist(id, unit, status, segment.clone()).await?;
            document.push_str(&segment);
            info!(project_id = %id, unit, target, chars = chosen.chars().count(), "chapter appended");

            if unit < target && !self.settings.unit_pacing.is_zero() {
                tokio::time::sleep(self.settings.unit_pacing).await;
            }
        }

        info!(project_id = %id, target, "pipeline run completed");
        Ok(RunOutcome::Completed)
    }

    /// Dispatch `candidate_count` independent draft requests, staggered by the
    /// dispatch pacing, and keep the non-empty successes in dispatch order.
    async fn collect_drafts(
        &self,
        id: ProjectId,
        model: &str,
        title: &str,
        unit: u32,
        context: &str,
    ) -> Vec<String> {
        let pacing = self.settings.dispatch_pacing;
        let requests = (0..self.settings.candidate_count).map(|index| {
            let conversation = prompt::draft_conversation(title, unit, context);
            let delay = pacing * index as u32;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!(project_id = %id, unit, candidate = index + 1, "requesting draft");
                (index, self.client.generate(model, conversation).await)
            }
        });

        let mut drafts = Vec::with_capacity(self.settings.candidate_count);
        for (index, result) in join_all(requests).await {
            match result {
                Ok(text) if !text.trim().is_empty() => drafts.push(text),
                Ok(_) => {
                    warn!(project_id = %id, unit, candidate = index + 1, error = %GenerationFailure::EmptyResponse, "draft failed");
                }
                Err(err) => {
                    warn!(project_id = %id, unit, candidate = index + 1, error = %err, "draft failed");
                }
            }
        }
        drafts
    }

    async fn fail(
        &self,
        id: ProjectId,
        position: u32,
        unit: u32,
        reason: &str,
    ) -> Result<RunOutcome, ApiError> {
        self.persist(id, position, ProjectStatus::failed(reason), String::new())
            .await?;
        Ok(RunOutcome::Failed {
            unit,
            reason: reason.to_string(),
        })
    }

    /// One store update, run on the blocking pool. Rejected writes stay
    /// [`ApiError::StorageError`].
    async fn persist(
        &self,
        id: ProjectId,
        unit_index: u32,
        status: ProjectStatus,
        segment: String,
    ) -> Result<(), ApiError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            store.append_and_advance(id, unit_index, status, &segment)
        })
        .await
        .map_err(|e| ApiError::PipelineFailed(format!("store write task failed: {}", e)))?
        .map(|_| ())
        .map_err(ApiError::StorageError)
    }
}
