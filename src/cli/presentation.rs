//! CLI presentation: text and json formatters per command family.

mod progress;
mod project;

pub use progress::{format_progress_line, format_run_outcome};
pub use project::{
    format_project_json, format_project_list_json, format_project_list_text, format_project_text,
};
