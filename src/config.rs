//! Configuration System
//!
//! Layered configuration for provider access, pipeline pacing, storage
//! location, observer polling and logging. Sources are merged by the
//! [`ConfigLoader`]; CLI flags are applied on top by the caller.

use crate::arbiter::SelectionCheck;
use crate::logging::LoggingConfig;
use crate::pipeline::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use crate::provider::ProviderConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrivenerConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Draft fan-out and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// Stagger between draft dispatches, in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub dispatch_pacing_ms: u64,

    /// Pause between chapters, in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub unit_pacing_ms: u64,

    #[serde(default)]
    pub selection_check: SelectionCheck,
}

fn default_candidate_count() -> usize {
    PipelineSettings::DEFAULT_CANDIDATE_COUNT
}

fn default_pacing_ms() -> u64 {
    PipelineSettings::DEFAULT_PACING.as_millis() as u64
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidate_count: default_candidate_count(),
            dispatch_pacing_ms: default_pacing_ms(),
            unit_pacing_ms: default_pacing_ms(),
            selection_check: SelectionCheck::default(),
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            candidate_count: self.candidate_count,
            dispatch_pacing: Duration::from_millis(self.dispatch_pacing_ms),
            unit_pacing: Duration::from_millis(self.unit_pacing_ms),
        }
    }
}

/// Where the progress store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// `$XDG_DATA_HOME/scrivener/store` or the platform equivalent.
pub fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "scrivener")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".scrivener/store"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ObserverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
    Storage(String),
    Observer(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Observer(msg) => write!(f, "Observer: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ScrivenerConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if self.pipeline.candidate_count == 0 {
            errors.push(ValidationError::Pipeline(
                "candidate_count must be at least 1".to_string(),
            ));
        }
        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }
        if self.observer.poll_interval_ms == 0 {
            errors.push(ValidationError::Observer(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
