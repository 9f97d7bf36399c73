//! Durable sled-backed project progress store.
//!
//! Each project lives under a single key, so every update replaces the whole
//! record in one compare-and-swap. Readers therefore never see a position that
//! disagrees with the document, and concurrent writers to one project are
//! serialized by the CAS retry loop.

use std::io;
use std::path::Path;
use std::sync::Arc;

use sled::{Db, Tree};
use tracing::debug;

use crate::error::StorageError;
use crate::project::{Project, ProjectStatus, ProjectSummary};
use crate::types::ProjectId;

const TREE_PROJECTS: &str = "projects";

#[derive(Clone)]
pub struct ProgressStore {
    db: Db,
    projects: Tree,
}

impl ProgressStore {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let projects = db.open_tree(TREE_PROJECTS).map_err(to_storage_io)?;
        Ok(Self { db, projects })
    }

    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database at {}: {}", path.display(), e),
            ))
        })?;
        Self::new(db)
    }

    pub fn shared(db: Db) -> Result<Arc<Self>, StorageError> {
        Ok(Arc::new(Self::new(db)?))
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Allocate a new queued project.
    pub fn create(&self, title: &str, target_length: u32) -> Result<ProjectId, StorageError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(invalid_input("title must not be empty"));
        }
        if target_length == 0 {
            return Err(invalid_input("target length must be positive"));
        }

        let id = ProjectId::new(self.db.generate_id().map_err(to_storage_io)?);
        let project = Project::new(id, title.to_string(), target_length);
        let value = encode(&project)?;
        self.projects
            .insert(id.to_key(), value)
            .map_err(to_storage_io)?;
        self.flush()?;
        debug!(project_id = %id, title = %title, target_length, "project created");
        Ok(id)
    }

    pub fn get(&self, id: ProjectId) -> Result<Project, StorageError> {
        self.find(id)?.ok_or(StorageError::ProjectNotFound(id))
    }

    pub fn find(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let Some(raw) = self.projects.get(id.to_key()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        Ok(Some(decode(&raw)?))
    }

    /// All projects, most recently created first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>, StorageError> {
        let mut out = Vec::new();
        for result in self.projects.iter().rev() {
            let (_, value) = result.map_err(to_storage_io)?;
            let project = decode(&value)?;
            out.push(project.summary());
        }
        Ok(out)
    }

    /// Projects left in a non-terminal state, e.g. by a process that exited mid-run.
    pub fn list_stalled(&self) -> Result<Vec<ProjectSummary>, StorageError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|summary| !summary.status.is_terminal())
            .collect())
    }

    /// Atomically set `position = unit_index` and `status`, appending `segment`.
    ///
    /// `unit_index == position` is a status-only update and requires an empty
    /// segment. `unit_index == position + 1` appends one chapter and requires
    /// a non-empty segment. Anything else is rejected, as is any update to a
    /// project that already failed or completed.
    pub fn append_and_advance(
        &self,
        id: ProjectId,
        unit_index: u32,
        status: ProjectStatus,
        segment: &str,
    ) -> Result<Project, StorageError> {
        let updated = self.update(id, |current| {
            let mut next = current.clone();
            check_transition(current, unit_index, &status, segment)?;
            if unit_index > current.position {
                next.segments.push(segment.to_string());
            }
            next.position = unit_index;
            next.status = status.clone();
            Ok(next)
        })?;
        debug!(
            project_id = %id,
            position = updated.position,
            status = %updated.status,
            appended = segment.len(),
            "project updated"
        );
        Ok(updated)
    }

    /// Status-only update at the current position.
    pub fn set_status(&self, id: ProjectId, status: ProjectStatus) -> Result<Project, StorageError> {
        let position = self.get(id)?.position;
        self.append_and_advance(id, position, status, "")
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }

    /// Read-modify-write loop over one project key. `apply` may run more than
    /// once if another writer raced us.
    fn update<F>(&self, id: ProjectId, apply: F) -> Result<Project, StorageError>
    where
        F: Fn(&Project) -> Result<Project, StorageError>,
    {
        let key = id.to_key();
        loop {
            let Some(raw) = self.projects.get(key).map_err(to_storage_io)? else {
                return Err(StorageError::ProjectNotFound(id));
            };
            let current = decode(&raw)?;
            let next = apply(&current)?;
            let value = encode(&next)?;
            match self
                .projects
                .compare_and_swap(key, Some(raw), Some(value))
                .map_err(to_storage_io)?
            {
                Ok(()) => {
                    self.flush()?;
                    return Ok(next);
                }
                Err(_) => {
                    debug!(project_id = %id, "concurrent project update, retrying");
                }
            }
        }
    }
}

fn check_transition(
    current: &Project,
    unit_index: u32,
    status: &ProjectStatus,
    segment: &str,
) -> Result<(), StorageError> {
    let reject = |reason: String| StorageError::InvalidUpdate {
        id: current.id,
        reason,
    };

    if current.status.is_terminal() {
        return Err(reject(format!(
            "project is already {}",
            current.status.label()
        )));
    }
    if unit_index > current.target_length {
        return Err(reject(format!(
            "unit {} exceeds target length {}",
            unit_index, current.target_length
        )));
    }
    if unit_index == current.position {
        if !segment.is_empty() {
            return Err(reject(format!(
                "unit {} already has text; segments are append-only",
                unit_index
            )));
        }
    } else if unit_index == current.position + 1 {
        if segment.is_empty() {
            return Err(reject(format!("unit {} needs a non-empty segment", unit_index)));
        }
    } else {
        return Err(reject(format!(
            "position must advance by one (current {}, requested {})",
            current.position, unit_index
        )));
    }

    let reaches_target = unit_index == current.target_length;
    match status {
        ProjectStatus::Completed if !reaches_target => Err(reject(format!(
            "cannot complete at position {} of {}",
            unit_index, current.target_length
        ))),
        ProjectStatus::Completed => Ok(()),
        _ if reaches_target && unit_index > current.position => Err(reject(
            "appending the final unit must complete the project".to_string(),
        )),
        _ => Ok(()),
    }
}

fn invalid_input(reason: &str) -> StorageError {
    StorageError::InvalidInput(reason.to_string())
}

fn encode(project: &Project) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(project).map_err(to_storage_data)
}

fn decode(raw: &[u8]) -> Result<Project, StorageError> {
    serde_json::from_slice(raw).map_err(to_storage_data)
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}
