//! CLI domain: parse, route, help, output, and presentation only.
//! No pipeline logic; the route table hands off to the runner, store and observer.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_progress_line, format_project_json, format_project_list_json,
    format_project_list_text, format_project_text, format_run_outcome,
};
pub use route::RunContext;
