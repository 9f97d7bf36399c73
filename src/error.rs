//! Error types for the Scrivener writing pipeline.

use crate::types::ProjectId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Invalid project input: {0}")]
    InvalidInput(String),

    #[error("Rejected update for project {id}: {reason}")]
    InvalidUpdate { id: ProjectId, reason: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single failed call to the generation service.
///
/// This is the only error value that crosses the generation client boundary;
/// transport, status and decode problems are all folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("No candidates to select from")]
    NoCandidates,

    #[error("Selected text matches none of the {0} candidates")]
    UnmatchedSelection(usize),
}

/// Crate-level errors surfaced to callers of the pipeline and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("A run is already active for project {0}")]
    RunInProgress(ProjectId),

    #[error("Project {id} cannot be resumed: {reason}")]
    NotResumable { id: ProjectId, reason: String },

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GenerationFailure),

    #[error("Pipeline failed: {0}")]
    PipelineFailed(String),

    #[error("Storage error: {0}")]
    StorageError(StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ProjectNotFound(id) => ApiError::ProjectNotFound(id),
            StorageError::InvalidInput(reason) => ApiError::InvalidInput(reason),
            StorageError::InvalidUpdate { reason, .. } => ApiError::InvalidInput(reason),
            other => ApiError::StorageError(other),
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
