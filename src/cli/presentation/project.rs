//! Project presentation: list and show, text and json.

use crate::progress::ProgressView;
use crate::project::{Project, ProjectStatus, ProjectSummary};
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub(crate) fn styled_status(status: &ProjectStatus) -> String {
    let label = status.label();
    match status {
        ProjectStatus::Completed => format!("{}", label.green()),
        ProjectStatus::Failed { .. } => format!("{}", label.red()),
        _ => format!("{}", label.yellow()),
    }
}

pub fn format_project_list_text(projects: &[ProjectSummary]) -> String {
    if projects.is_empty() {
        return "No projects found.\n\nUse 'scrivener start --title <TITLE> --chapters <N>' to begin one."
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Title", "Status"]);
    for project in projects {
        table.add_row(vec![
            project.id.to_string(),
            project.title.clone(),
            project.status.label(),
        ]);
    }
    format!("{}\n\nTotal: {} project(s)", table, projects.len())
}

pub fn format_project_list_json(projects: &[ProjectSummary]) -> String {
    let rows: Vec<_> = projects
        .iter()
        .map(|project| {
            json!({
                "id": project.id,
                "title": project.title,
                "status": project.status.label(),
                "terminal": project.status.is_terminal(),
            })
        })
        .collect();
    let out = json!({ "projects": rows, "total": projects.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_project_text(project: &Project) -> String {
    let view = ProgressView::from_project(project);
    let mut output = format!("{}\n", project.title.bold().underline());
    output.push_str(&format!("Project: {}\n", project.id));
    output.push_str(&format!(
        "Progress: {} ({:.0}%)\n",
        view.progress_label(),
        view.fraction() * 100.0
    ));
    output.push_str(&format!("Status: {}\n", styled_status(&project.status)));
    output.push_str(&format!(
        "Created: {}\n",
        project.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let document = project.document();
    if document.is_empty() {
        output.push_str("\n(no chapters yet)");
    } else {
        output.push_str(&document);
    }
    output
}

pub fn format_project_json(project: &Project) -> String {
    let view = ProgressView::from_project(project);
    let out = json!({
        "id": project.id,
        "title": project.title,
        "position": project.position,
        "target_length": project.target_length,
        "status": view.status,
        "state": project.status,
        "terminal": view.terminal,
        "created_at": project.created_at.to_rfc3339(),
        "document": project.document(),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
