use crate::error::ApiError;
use crate::provider::Credential;
use std::time::Duration;

/// Largest chapter count a start request may ask for.
pub const MAX_TARGET_LENGTH: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Drafts requested per chapter; all of them must succeed.
    pub candidate_count: usize,
    /// Stagger between consecutive draft dispatches.
    pub dispatch_pacing: Duration,
    /// Pause after a chapter is appended, before the next one starts.
    pub unit_pacing: Duration,
}

impl PipelineSettings {
    pub const DEFAULT_CANDIDATE_COUNT: usize = 3;
    pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

    /// No pacing at all; used where rate limits do not apply.
    pub fn unpaced(candidate_count: usize) -> Self {
        Self {
            candidate_count,
            dispatch_pacing: Duration::ZERO,
            unit_pacing: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.candidate_count == 0 {
            return Err(ApiError::ConfigError(
                "Candidate count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            candidate_count: Self::DEFAULT_CANDIDATE_COUNT,
            dispatch_pacing: Self::DEFAULT_PACING,
            unit_pacing: Self::DEFAULT_PACING,
        }
    }
}

/// Request to create a project and run it.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub title: String,
    pub target_length: u32,
    pub model: String,
    pub credential: Credential,
}

impl StartRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("title must not be empty".to_string()));
        }
        if !(1..=MAX_TARGET_LENGTH).contains(&self.target_length) {
            return Err(ApiError::InvalidInput(format!(
                "chapter count must be between 1 and {} (got {})",
                MAX_TARGET_LENGTH, self.target_length
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ApiError::InvalidInput("model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// How a driver run ended. Storage problems are errors, not outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed { unit: u32, reason: String },
}
