//! Polling observer for project progress.
//!
//! Polls at an explicit interval and stops on its own once the project reaches
//! a terminal status. The store is read-only from here.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::error::StorageError;
use crate::progress::store::ProgressStore;
use crate::project::{Project, ProjectStatus};
use crate::types::ProjectId;

/// Render-ready view of a project's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub id: ProjectId,
    pub title: String,
    pub position: u32,
    pub target_length: u32,
    pub status: String,
    pub terminal: bool,
}

impl ProgressView {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: project.id,
            title: project.title.clone(),
            position: project.position,
            target_length: project.target_length,
            status: project.status.label(),
            terminal: project.status.is_terminal(),
        }
    }

    /// Completed fraction in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.target_length == 0 {
            return 0.0;
        }
        (f64::from(self.position) / f64::from(self.target_length)).min(1.0)
    }

    pub fn progress_label(&self) -> String {
        format!("{}/{} chapters", self.position, self.target_length)
    }
}

pub struct ProgressObserver {
    store: Arc<ProgressStore>,
    poll_interval: Duration,
}

impl ProgressObserver {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

    /// Intervals below [`Self::MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(store: Arc<ProgressStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval: poll_interval.max(Self::MIN_POLL_INTERVAL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Current snapshot, without waiting.
    pub fn snapshot(&self, id: ProjectId) -> Result<Project, StorageError> {
        self.store.get(id)
    }

    /// Poll until the project is terminal, calling `on_change` for the first
    /// snapshot and for every snapshot whose position or status differs from
    /// the previous one. Returns the terminal snapshot.
    pub async fn follow<F>(&self, id: ProjectId, mut on_change: F) -> Result<Project, StorageError>
    where
        F: FnMut(&Project),
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<(u32, ProjectStatus)> = None;

        loop {
            ticker.tick().await;
            let project = self.store.get(id)?;
            let observed = (project.position, project.status.clone());
            if last.as_ref() != Some(&observed) {
                trace!(project_id = %id, position = project.position, status = %project.status, "progress changed");
                on_change(&project);
                last = Some(observed);
            }
            if project.status.is_terminal() {
                return Ok(project);
            }
        }
    }
}
