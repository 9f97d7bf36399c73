//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output, with a hint where
/// there is an obvious next command.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProjectNotFound(_) => {
            format!("{}\n\nUse 'scrivener list' to see known projects.", e)
        }
        ApiError::RunInProgress(id) => format!(
            "{}\n\nLet the current run finish, then use 'scrivener show {}' to see where it ended.",
            e, id
        ),
        _ => e.to_string(),
    }
}
