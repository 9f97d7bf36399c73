//! Project records: one title + target-length run and its persisted document.

use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason recorded when fewer drafts than required came back for a chapter.
pub const DRAFT_FAILURE_REASON: &str = "draft generation failed";

/// Reason recorded when arbitration between drafts failed.
pub const SELECTION_FAILURE_REASON: &str = "selection failed";

/// Pipeline status of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProjectStatus {
    Queued,
    Generating { unit: u32 },
    Selecting { unit: u32 },
    Running,
    Failed { reason: String },
    Completed,
}

impl ProjectStatus {
    pub fn failed(reason: impl Into<String>) -> Self {
        ProjectStatus::Failed {
            reason: reason.into(),
        }
    }

    /// Failed and completed projects never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Failed { .. } | ProjectStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProjectStatus::Failed { .. })
    }

    pub fn label(&self) -> String {
        match self {
            ProjectStatus::Queued => "queued".to_string(),
            ProjectStatus::Generating { unit } => format!("generating chapter {unit}"),
            ProjectStatus::Selecting { unit } => format!("selecting chapter {unit}"),
            ProjectStatus::Running => "writing".to_string(),
            ProjectStatus::Failed { reason } => format!("failed: {reason}"),
            ProjectStatus::Completed => "completed".to_string(),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Full project snapshot as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub target_length: u32,
    pub position: u32,
    pub status: ProjectStatus,
    /// One segment per appended chapter, in chapter order.
    #[serde(default)]
    pub segments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: ProjectId, title: String, target_length: u32) -> Self {
        Self {
            id,
            title,
            target_length,
            position: 0,
            status: ProjectStatus::Queued,
            segments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The accumulated document as a single text.
    pub fn document(&self) -> String {
        self.segments.concat()
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.target_length
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status.clone(),
        }
    }
}

/// Listing row: `(id, title, status)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub status: ProjectStatus,
}

/// Labels a chosen chapter text the way it is appended to the document.
pub fn format_unit(unit: u32, text: &str) -> String {
    format!("\n\n---\n\n## Chapter {unit}\n\n{text}")
}

/// Heading line that `format_unit` places before each chapter.
pub fn unit_heading(unit: u32) -> String {
    format!("## Chapter {unit}")
}
