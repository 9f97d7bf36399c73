//! Progress presentation: live lines while a run is followed, and the final outcome.

use super::project::styled_status;
use crate::progress::ProgressView;
use crate::project::{Project, ProjectStatus};

/// One line per observed change, e.g. `[project 3] 1/4 chapters - generating chapter 2`.
pub fn format_progress_line(project: &Project) -> String {
    let view = ProgressView::from_project(project);
    format!(
        "[project {}] {} - {}",
        project.id,
        view.progress_label(),
        styled_status(&project.status)
    )
}

pub fn format_run_outcome(project: &Project) -> String {
    match &project.status {
        ProjectStatus::Completed => format!(
            "Project {} \"{}\" completed: {} chapters written.\n\nUse 'scrivener show {}' to read it.",
            project.id, project.title, project.position, project.id
        ),
        ProjectStatus::Failed { reason } => format!(
            "Project {} \"{}\" failed after {}/{} chapters: {}",
            project.id, project.title, project.position, project.target_length, reason
        ),
        other => format!(
            "Project {} \"{}\" stopped at {}/{} chapters ({}).\n\nUse 'scrivener resume {}' to continue.",
            project.id,
            project.title,
            project.position,
            project.target_length,
            other.label(),
            project.id
        ),
    }
}
