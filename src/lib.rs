//! Scrivener: resumable chapter-by-chapter long-form generation
//!
//! A project is a title plus a target chapter count. For each chapter the
//! pipeline requests several candidate drafts, has the model pick the best
//! one, and appends it to a durable document. Progress can be read at any
//! time, and an interrupted project resumes from its last saved chapter.

pub mod arbiter;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod project;
pub mod prompt;
pub mod provider;
pub mod types;
